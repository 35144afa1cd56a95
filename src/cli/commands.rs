//! CLI command implementations.

use chrono::{DateTime, Utc};

use crate::engine::{MemoryStats, MemoryUpdate};
use crate::store::HierarchicalMemory;
use crate::types::{format_timestamp, MemoryEntry, MemoryLevel, MemoryResult};

/// Add a memory.
pub fn cmd_add(
    store: &HierarchicalMemory,
    level: MemoryLevel,
    content: &str,
    tags: &[&str],
    parent: Option<&str>,
    json: bool,
) -> MemoryResult<()> {
    let id = store.add_safe(content, level, tags, parent)?;
    if json {
        println!(
            "{}",
            serde_json::json!({"id": id, "level": level.name(), "parent_id": parent})
        );
    } else {
        println!("Added memory {} ({})", id, level.name());
    }
    Ok(())
}

/// Show one memory.
pub fn cmd_get(store: &HierarchicalMemory, id: &str, json: bool) -> MemoryResult<()> {
    let entry = store.get_safe(id)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entry).unwrap_or_default()
        );
    } else {
        println!("ID: {}", entry.id);
        println!("Level: {}", entry.level);
        println!("Tags: {}", entry.tags.join(", "));
        println!("Created: {}", format_timestamp(&entry.created_at));
        println!("Last accessed: {}", format_timestamp(&entry.last_accessed));
        println!("Access count: {}", entry.access_count);
        println!("Parent: {}", entry.parent_id.as_deref().unwrap_or("-"));
        println!("Children: {}", entry.children.len());
        println!("Content: {}", entry.content);
    }
    Ok(())
}

/// Change some fields of a memory.
pub fn cmd_update(
    store: &HierarchicalMemory,
    id: &str,
    update: MemoryUpdate,
    json: bool,
) -> MemoryResult<()> {
    store.update_safe(id, update)?;
    if json {
        println!("{}", serde_json::json!({"id": id, "updated": true}));
    } else {
        println!("Updated memory {}", id);
    }
    Ok(())
}

/// Delete a memory and its subtree.
pub fn cmd_delete(store: &HierarchicalMemory, id: &str, json: bool) -> MemoryResult<()> {
    let removed = store.delete_safe(id)?;
    if json {
        println!("{}", serde_json::json!({"id": id, "removed": removed}));
    } else {
        println!("Deleted {} memories", removed);
    }
    Ok(())
}

/// Re-parent a memory.
pub fn cmd_move(
    store: &HierarchicalMemory,
    id: &str,
    parent: Option<&str>,
    json: bool,
) -> MemoryResult<()> {
    store.move_memory(id, parent)?;
    if json {
        println!("{}", serde_json::json!({"id": id, "parent_id": parent}));
    } else {
        match parent {
            Some(p) => println!("Moved {} under {}", id, p),
            None => println!("Moved {} to the top level", id),
        }
    }
    Ok(())
}

/// Search criteria from the command line. The first one set wins.
#[derive(Debug, Default)]
pub struct SearchArgs {
    pub all_tags: Option<Vec<String>>,
    pub any_tags: Option<Vec<String>>,
    pub content: Option<String>,
    pub regex: Option<String>,
    pub level: Option<MemoryLevel>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

/// Run one search.
pub fn cmd_search(store: &HierarchicalMemory, args: SearchArgs, json: bool) -> MemoryResult<()> {
    let results = if let Some(tags) = &args.all_tags {
        store.search_by_tags(&as_strs(tags))?
    } else if let Some(tags) = &args.any_tags {
        store.search_by_tags_or(&as_strs(tags))?
    } else if let Some(needle) = &args.content {
        store.search_by_content(needle)?
    } else if let Some(pattern) = &args.regex {
        store.search_by_content_regex(pattern)?
    } else if let Some(level) = args.level {
        store.get_by_level(level)?
    } else if args.created_from.is_some() || args.created_to.is_some() {
        let start = args.created_from.unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = args.created_to.unwrap_or(DateTime::<Utc>::MAX_UTC);
        store.get_by_date_range(start, end)?
    } else {
        store.get_all()?
    };
    print_entries(&results, json);
    Ok(())
}

/// List every memory.
pub fn cmd_list(store: &HierarchicalMemory, json: bool) -> MemoryResult<()> {
    print_entries(&store.get_all()?, json);
    Ok(())
}

/// List the direct children of a memory.
pub fn cmd_children(store: &HierarchicalMemory, id: &str, json: bool) -> MemoryResult<()> {
    print_entries(&store.get_children(id)?, json);
    Ok(())
}

/// List the top-level memories.
pub fn cmd_roots(store: &HierarchicalMemory, json: bool) -> MemoryResult<()> {
    print_entries(&store.get_roots()?, json);
    Ok(())
}

/// Print the forest as an indented tree.
pub fn cmd_tree(store: &HierarchicalMemory, json: bool) -> MemoryResult<()> {
    let hierarchy = store.get_hierarchy();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&hierarchy).unwrap_or_default()
        );
        return Ok(());
    }

    let mut is_child = std::collections::HashSet::new();
    for children in hierarchy.values() {
        is_child.extend(children.iter().map(String::as_str));
    }
    let mut stack: Vec<(&str, usize)> = hierarchy
        .keys()
        .filter(|id| !is_child.contains(id.as_str()))
        .rev()
        .map(|id| (id.as_str(), 0))
        .collect();
    while let Some((id, depth)) = stack.pop() {
        println!("{}{}", "  ".repeat(depth), id);
        if let Some(children) = hierarchy.get(id) {
            for child in children.iter().rev() {
                stack.push((child.as_str(), depth + 1));
            }
        }
    }
    Ok(())
}

/// Most accessed memories.
pub fn cmd_top(store: &HierarchicalMemory, limit: usize, json: bool) -> MemoryResult<()> {
    print_entries(&store.get_most_accessed(limit)?, json);
    Ok(())
}

/// Most recently accessed memories.
pub fn cmd_recent(store: &HierarchicalMemory, limit: usize, json: bool) -> MemoryResult<()> {
    print_entries(&store.get_recently_accessed(limit)?, json);
    Ok(())
}

/// Store statistics.
pub fn cmd_stats(store: &HierarchicalMemory, json: bool) -> MemoryResult<()> {
    let stats: MemoryStats = store.get_memory_stats();
    let file_size = std::fs::metadata(store.data_file())
        .map(|m| m.len())
        .unwrap_or(0);

    if json {
        let info = serde_json::json!({
            "data_file": store.data_file().display().to_string(),
            "file_size": file_size,
            "total": stats.total,
            "roots": stats.root_count,
            "total_accesses": stats.total_accesses,
            "levels": {
                "short_term": stats.count(MemoryLevel::ShortTerm),
                "medium_term": stats.count(MemoryLevel::MediumTerm),
                "long_term": stats.count(MemoryLevel::LongTerm),
            }
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&info).unwrap_or_default()
        );
    } else {
        println!("Data file: {}", store.data_file().display());
        println!("File size: {}", format_size(file_size));
        println!("Memories: {}", stats.total);
        println!("Roots: {}", stats.root_count);
        println!("Total accesses: {}", stats.total_accesses);
        println!("Levels:");
        for level in MemoryLevel::ALL {
            println!("  {}: {}", level.name(), stats.count(level));
        }
    }
    Ok(())
}

fn print_entries(entries: &[MemoryEntry], json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(entries).unwrap_or_default()
        );
        return;
    }
    if entries.is_empty() {
        println!("No memories found.");
        return;
    }
    for entry in entries {
        let tags = if entry.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", entry.tags.join(", "))
        };
        println!(
            "{} ({}, {}x){}: {}",
            entry.id,
            entry.level.name(),
            entry.access_count,
            tags,
            truncate(&entry.content, 80)
        );
    }
}

fn as_strs(tags: &[String]) -> Vec<&str> {
    tags.iter().map(String::as_str).collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
