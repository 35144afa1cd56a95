//! CLI integration tests: drive the `hmem` binary end to end.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

use hierarchical_memory::format::MemoryReader;
use hierarchical_memory::types::DATA_FILE_NAME;

// ==================== CLI Helpers ====================

/// Run `hmem --data-dir <dir> <args>` with a clean environment.
fn run_hmem(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hmem"))
        .arg("--data-dir")
        .arg(dir)
        .args(args)
        .env_remove("HMEM_DATA_DIR")
        .env_remove("HMEM_MAX_CONTENT_LENGTH")
        .env_remove("HMEM_MAX_TAG_LENGTH")
        .env_remove("HMEM_MAX_TAG_COUNT")
        .output()
        .expect("Failed to run hmem")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "hmem failed with status {:?}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
}

fn stdout_str(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert_success(output);
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Add through the CLI and return the new ID.
fn add(dir: &Path, level: &str, content: &str, extra: &[&str]) -> String {
    let mut args = vec!["--format", "json", "add", level, content];
    args.extend_from_slice(extra);
    let out = stdout_json(&run_hmem(dir, &args));
    out["id"].as_str().unwrap().to_string()
}

// ==================== CLI Tests ====================

#[test]
fn test_cli_add_and_get() {
    let dir = TempDir::new().unwrap();
    let id = add(dir.path(), "lt", "Prefers dark mode", &["--tags", "ui, prefs"]);

    let output = run_hmem(dir.path(), &["get", &id]);
    assert_success(&output);
    let text = stdout_str(&output);
    assert!(text.contains("Prefers dark mode"), "got: {text}");
    assert!(text.contains("long_term"));
    assert!(text.contains("ui, prefs"));
    assert!(text.contains("Access count: 1"));

    let entry = stdout_json(&run_hmem(dir.path(), &["--format", "json", "get", &id]));
    assert_eq!(entry["id"], id.as_str());
    assert_eq!(entry["access_count"], 2);

    let index = MemoryReader::read_from_file(&dir.path().join(DATA_FILE_NAME)).unwrap();
    assert_eq!(index.len(), 1);
}

#[test]
fn test_cli_tree_and_children() {
    let dir = TempDir::new().unwrap();
    let root = add(dir.path(), "long_term", "project", &[]);
    let child = add(dir.path(), "mt", "task", &["--parent", &root]);
    let grandchild = add(dir.path(), "st", "step", &["--parent", &child]);

    let output = run_hmem(dir.path(), &["tree"]);
    assert_success(&output);
    let lines: Vec<String> = stdout_str(&output).lines().map(String::from).collect();
    assert_eq!(
        lines,
        vec![root.clone(), format!("  {child}"), format!("    {grandchild}")]
    );

    let children = stdout_json(&run_hmem(
        dir.path(),
        &["--format", "json", "children", &root],
    ));
    assert_eq!(children.as_array().unwrap().len(), 1);
    assert_eq!(children[0]["id"], child.as_str());
}

#[test]
fn test_cli_search_and_stats() {
    let dir = TempDir::new().unwrap();
    add(dir.path(), "st", "Rust borrow checker", &["--tags", "rust"]);
    add(dir.path(), "st", "Python GIL", &["--tags", "python"]);
    add(dir.path(), "lt", "Rust async", &["--tags", "rust,async"]);

    let found = stdout_json(&run_hmem(
        dir.path(),
        &["--format", "json", "search", "--tags", "rust"],
    ));
    assert_eq!(found.as_array().unwrap().len(), 2);

    let found = stdout_json(&run_hmem(
        dir.path(),
        &["--format", "json", "search", "--content", "gil"],
    ));
    assert_eq!(found.as_array().unwrap().len(), 1);

    let found = stdout_json(&run_hmem(
        dir.path(),
        &["--format", "json", "search", "--level", "long"],
    ));
    assert_eq!(found[0]["content"], "Rust async");

    let stats = stdout_json(&run_hmem(dir.path(), &["--format", "json", "stats"]));
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["roots"], 3);
    assert_eq!(stats["levels"]["short_term"], 2);
    assert_eq!(stats["levels"]["long_term"], 1);
    // Two tag hits, one content hit, one level hit.
    assert_eq!(stats["total_accesses"], 4);
}

#[test]
fn test_cli_update_move_delete() {
    let dir = TempDir::new().unwrap();
    let a = add(dir.path(), "lt", "a", &[]);
    let b = add(dir.path(), "lt", "b", &[]);
    let c = add(dir.path(), "st", "c", &["--parent", &a]);

    assert_success(&run_hmem(dir.path(), &["update", &c, "--content", "c2", "--level", "mt"]));
    let entry = stdout_json(&run_hmem(dir.path(), &["--format", "json", "get", &c]));
    assert_eq!(entry["content"], "c2");
    assert_eq!(entry["level"], "MediumTerm");

    assert_success(&run_hmem(dir.path(), &["move", &c, "--parent", &b]));
    let index = MemoryReader::read_from_file(&dir.path().join(DATA_FILE_NAME)).unwrap();
    assert_eq!(index.get(&c).unwrap().parent_id.as_deref(), Some(b.as_str()));

    // Moving b under its own child is refused.
    let output = run_hmem(dir.path(), &["move", &b, "--parent", &c]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("CircularDependency"));

    let out = stdout_json(&run_hmem(dir.path(), &["--format", "json", "delete", &b]));
    assert_eq!(out["removed"], 2);
    let index = MemoryReader::read_from_file(&dir.path().join(DATA_FILE_NAME)).unwrap();
    assert_eq!(index.len(), 1);
    assert!(index.contains(&a));
}

#[test]
fn test_cli_errors() {
    let dir = TempDir::new().unwrap();

    let output = run_hmem(dir.path(), &["add", "forever", "content"]);
    assert_eq!(output.status.code(), Some(3));

    let output = run_hmem(dir.path(), &["get", "no-such-id"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("MemoryNotFound"));

    let output = run_hmem(dir.path(), &["add", "st", "orphan", "--parent", "no-such-id"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ParentNotFound"));

    let output = run_hmem(dir.path(), &["add", "st", "x", "--tags", "bad tag"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("InvalidTags"));
}

#[test]
fn test_cli_config_file_limits() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("hmem.toml");
    std::fs::write(&config_path, "[limits]\nmax_content_length = 5\n").unwrap();
    let config = config_path.to_str().unwrap();

    assert_success(&run_hmem(dir.path(), &["--config", config, "add", "st", "short"]));
    let output = run_hmem(dir.path(), &["--config", config, "add", "st", "too long"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("InvalidContent"));
}
