//! High-level operations: write engine and query engine.

pub mod query;
pub mod write;

pub use query::{MemoryFilter, MemoryStats, QueryEngine, RankBy};
pub use write::{DeleteReport, MemoryUpdate, WriteEngine};
