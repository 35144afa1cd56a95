//! JSON file I/O for the data directory.

pub mod reader;
pub mod writer;

pub use reader::MemoryReader;
pub use writer::MemoryWriter;
