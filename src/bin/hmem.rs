//! CLI entry point for the `hmem` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use hierarchical_memory::cli::commands::{self, SearchArgs};
use hierarchical_memory::config::{load_config, resolve_data_dir, MemoryConfig};
use hierarchical_memory::engine::MemoryUpdate;
use hierarchical_memory::store::HierarchicalMemory;
use hierarchical_memory::types::{parse_timestamp, MemoryLevel};

#[derive(Parser)]
#[command(
    name = "hmem",
    about = "HierarchicalMemory CLI: embedded tree-structured memory for AI agents"
)]
struct Cli {
    /// Data directory (default: $HMEM_DATA_DIR, then ./memory_data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML config file with data_dir and [limits]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format: "text" (default) or "json"
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a memory
    Add {
        /// Level: short_term, medium_term, long_term (or st, mt, lt)
        level: String,
        /// The content text
        content: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Parent memory ID
        #[arg(long)]
        parent: Option<String>,
    },
    /// Show a memory by ID
    Get {
        /// Memory ID
        id: String,
    },
    /// Change the content, level or tags of a memory
    Update {
        /// Memory ID
        id: String,
        /// New content
        #[arg(long)]
        content: Option<String>,
        /// New level
        #[arg(long)]
        level: Option<String>,
        /// New comma-separated tags (empty string clears them)
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a memory and everything below it
    Delete {
        /// Memory ID
        id: String,
    },
    /// Move a memory under another parent, or to the top level
    Move {
        /// Memory ID
        id: String,
        /// New parent ID (omit to make it a root)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Search memories
    Search {
        /// Comma-separated tags; all must match
        #[arg(long)]
        tags: Option<String>,
        /// Comma-separated tags; any may match
        #[arg(long)]
        any_tag: Option<String>,
        /// Case-insensitive content substring
        #[arg(long)]
        content: Option<String>,
        /// Content regular expression
        #[arg(long)]
        regex: Option<String>,
        /// Level filter
        #[arg(long)]
        level: Option<String>,
        /// Created at or after (YYYY-MM-DDTHH:MM:SSZ)
        #[arg(long)]
        from: Option<String>,
        /// Created at or before (YYYY-MM-DDTHH:MM:SSZ)
        #[arg(long)]
        to: Option<String>,
    },
    /// List all memories
    List,
    /// List the direct children of a memory
    Children {
        /// Memory ID
        id: String,
    },
    /// List top-level memories
    Roots,
    /// Print the whole forest
    Tree,
    /// Most accessed memories
    Top {
        /// Maximum results
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Most recently accessed memories
    Recent {
        /// Maximum results
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Statistics about the store
    Stats,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    let _ = logger.try_init();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error [{}]: {}", e.kind(), e);
                process::exit(3);
            }
        },
        None => MemoryConfig::default(),
    };
    config.apply_env();
    if cli.data_dir.is_some() {
        config.data_dir = resolve_data_dir(cli.data_dir.as_deref());
    }

    let store = match HierarchicalMemory::open(config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.kind(), e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Add {
            level,
            content,
            tags,
            parent,
        } => {
            let level = parse_level(&level);
            let tags = split_tags(tags.as_deref());
            let tag_refs: Vec<&str> = tags.iter().map(String::as_str).collect();
            commands::cmd_add(&store, level, &content, &tag_refs, parent.as_deref(), json)
        }
        Commands::Get { id } => commands::cmd_get(&store, &id, json),
        Commands::Update {
            id,
            content,
            level,
            tags,
        } => {
            let update = MemoryUpdate {
                content,
                level: level.as_deref().map(parse_level),
                tags: tags.as_deref().map(|t| split_tags(Some(t))),
            };
            if update.is_empty() {
                eprintln!("Nothing to update: pass --content, --level or --tags");
                process::exit(3);
            }
            commands::cmd_update(&store, &id, update, json)
        }
        Commands::Delete { id } => commands::cmd_delete(&store, &id, json),
        Commands::Move { id, parent } => commands::cmd_move(&store, &id, parent.as_deref(), json),
        Commands::Search {
            tags,
            any_tag,
            content,
            regex,
            level,
            from,
            to,
        } => {
            let args = SearchArgs {
                all_tags: tags.as_deref().map(|t| split_tags(Some(t))),
                any_tags: any_tag.as_deref().map(|t| split_tags(Some(t))),
                content,
                regex,
                level: level.as_deref().map(parse_level),
                created_from: from.as_deref().map(parse_date),
                created_to: to.as_deref().map(parse_date),
            };
            commands::cmd_search(&store, args, json)
        }
        Commands::List => commands::cmd_list(&store, json),
        Commands::Children { id } => commands::cmd_children(&store, &id, json),
        Commands::Roots => commands::cmd_roots(&store, json),
        Commands::Tree => commands::cmd_tree(&store, json),
        Commands::Top { limit } => commands::cmd_top(&store, limit, json),
        Commands::Recent { limit } => commands::cmd_recent(&store, limit, json),
        Commands::Stats => commands::cmd_stats(&store, json),
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {}", e.kind(), e);
        process::exit(1);
    }
}

fn parse_level(name: &str) -> MemoryLevel {
    match MemoryLevel::from_name(name) {
        Some(level) => level,
        None => {
            eprintln!("Invalid level: {}", name);
            process::exit(3);
        }
    }
}

fn parse_date(raw: &str) -> chrono::DateTime<chrono::Utc> {
    match parse_timestamp(raw) {
        Ok(ts) => ts,
        Err(_) => {
            eprintln!("Invalid timestamp: {} (expected YYYY-MM-DDTHH:MM:SSZ)", raw);
            process::exit(3);
        }
    }
}

fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
