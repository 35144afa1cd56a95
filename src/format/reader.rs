//! Reads the memories.json data file into an in-memory index.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::graph::MemoryIndex;
use crate::types::{MemoryEntry, MemoryError, MemoryResult};

/// Reader for the JSON data file.
pub struct MemoryReader;

impl MemoryReader {
    /// Read the data file at `path`.
    ///
    /// A missing or empty file yields an empty index.
    pub fn read_from_file(path: &Path) -> MemoryResult<MemoryIndex> {
        if !path.exists() {
            log::info!("No data file at {}, starting empty", path.display());
            return Ok(MemoryIndex::new());
        }
        let file = std::fs::File::open(path)?;
        let index = Self::read_from(&mut std::io::BufReader::new(file))?;
        log::info!("Loaded {} memories from {}", index.len(), path.display());
        Ok(index)
    }

    /// Read from any reader into an index.
    pub fn read_from(reader: &mut impl Read) -> MemoryResult<MemoryIndex> {
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        if data.trim().is_empty() {
            return Ok(MemoryIndex::new());
        }

        let records: BTreeMap<String, MemoryEntry> = serde_json::from_str(&data)?;
        let mut entries = Vec::with_capacity(records.len());
        for (key, entry) in records {
            if key != entry.id {
                return Err(MemoryError::JsonParse(format!(
                    "key {key} does not match record id {}",
                    entry.id
                )));
            }
            entries.push(entry);
        }

        MemoryIndex::from_entries(entries)
    }
}
