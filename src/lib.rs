//! HierarchicalMemory: embedded, process-local memory store for AI agents.
//!
//! Stores short-lived "memory" records in a forest of trees, each tagged with
//! a retention level (short/medium/long term). The whole store lives behind
//! one lock and is rewritten to a single JSON file on every change.

pub mod cli;
pub mod config;
pub mod engine;
pub mod format;
pub mod graph;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{load_config, resolve_data_dir, MemoryConfig};
pub use engine::{
    DeleteReport, MemoryFilter, MemoryStats, MemoryUpdate, QueryEngine, RankBy, WriteEngine,
};
pub use format::{MemoryReader, MemoryWriter};
pub use graph::{detect_cycle, MemoryIndex};
pub use store::HierarchicalMemory;
pub use types::{
    generate_id, now_seconds, validate_content, validate_level, validate_tags, MemoryEntry,
    MemoryEntryBuilder, MemoryError, MemoryErrorKind, MemoryLevel, MemoryResult,
    ValidationLimits, DATA_FILE_NAME,
};
