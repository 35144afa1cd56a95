//! Writes the memories.json data file from an in-memory index.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::graph::MemoryIndex;
use crate::types::MemoryResult;

/// Writer for the JSON data file.
pub struct MemoryWriter;

impl MemoryWriter {
    /// Rewrite the data file at `path` with the full index.
    ///
    /// The document is written to a sibling `.tmp` file and renamed over the
    /// target, so a crash mid-write leaves the previous file in place.
    pub fn write_to_file(index: &MemoryIndex, path: &Path) -> MemoryResult<()> {
        replace_file(path, |writer| Self::write_to(index, writer))?;
        log::debug!("Wrote {} memories to {}", index.len(), path.display());
        Ok(())
    }

    /// Write the index as one JSON object keyed by ID to any writer.
    pub fn write_to(index: &MemoryIndex, writer: &mut impl Write) -> MemoryResult<()> {
        serde_json::to_writer_pretty(&mut *writer, index.inner())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

/// Write `path` through a sibling `.tmp` file. The temp file never outlives a
/// failed call, whichever step failed.
fn replace_file<F>(path: &Path, write: F) -> MemoryResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> MemoryResult<()>,
{
    let tmp_path = tmp_path_for(path);
    let file = File::create(&tmp_path)?;

    let result = (|| -> MemoryResult<()> {
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryError, MemoryErrorKind};

    #[test]
    fn failed_write_removes_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memories.json");
        std::fs::write(&path, "{}\n").unwrap();

        let err = replace_file(&path, |w| {
            w.write_all(b"{ \"partial\": ")?;
            w.flush()?;
            Err(MemoryError::FileIo("disk full".to_string()))
        })
        .unwrap_err();

        assert_eq!(err.kind(), MemoryErrorKind::FileIoError);
        assert!(!tmp_path_for(&path).exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::TempDir::new().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let path = dir.path().join("occupied");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let err = MemoryWriter::write_to_file(&MemoryIndex::new(), &path).unwrap_err();
        assert_eq!(err.kind(), MemoryErrorKind::FileIoError);
        assert!(!tmp_path_for(&path).exists());
    }

    #[test]
    fn successful_write_leaves_only_the_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("memories.json");
        MemoryWriter::write_to_file(&MemoryIndex::new(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
        assert!(!tmp_path_for(&path).exists());
    }
}
