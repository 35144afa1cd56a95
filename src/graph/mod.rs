//! In-memory forest: the canonical index and its integrity rules.

pub mod memory_index;
pub mod tree;

pub use memory_index::MemoryIndex;
pub use tree::{detect_cycle, subtree_post_order};
