//! The store: one locked index per data directory, persisted on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::MemoryConfig;
use crate::engine::{MemoryFilter, MemoryStats, MemoryUpdate, QueryEngine, RankBy, WriteEngine};
use crate::format::{MemoryReader, MemoryWriter};
use crate::graph::MemoryIndex;
use crate::types::{
    MemoryEntry, MemoryError, MemoryLevel, MemoryResult, ValidationLimits, DATA_FILE_NAME,
};

/// An embedded hierarchical memory store.
///
/// Every public operation takes the same exclusive lock for its whole
/// duration, disk write included, so operations never interleave. Operations
/// that change state or record accesses rewrite the data file before
/// returning.
///
/// Two surfaces share one implementation: the `*_safe` methods (and every
/// query) return [`MemoryResult`]; the legacy [`add`](Self::add),
/// [`get`](Self::get), [`update`](Self::update) and [`delete`](Self::delete)
/// map an unknown ID to `None`/`false` and panic on any other failure.
///
/// Only this process coordinates access to the data file. Two processes
/// opening the same directory will overwrite each other's state.
pub struct HierarchicalMemory {
    data_dir: PathBuf,
    data_file: PathBuf,
    write_engine: WriteEngine,
    query_engine: QueryEngine,
    index: Mutex<MemoryIndex>,
}

impl HierarchicalMemory {
    /// Open the store in `config.data_dir`, creating the directory if needed
    /// and loading any existing data file.
    pub fn open(config: MemoryConfig) -> MemoryResult<Self> {
        config.limits.check()?;
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            MemoryError::FileIo(format!(
                "cannot create data directory {}: {e}",
                config.data_dir.display()
            ))
        })?;

        let data_file = config.data_dir.join(DATA_FILE_NAME);
        let index = MemoryReader::read_from_file(&data_file)?;

        Ok(Self {
            data_dir: config.data_dir,
            data_file,
            write_engine: WriteEngine::new(config.limits),
            query_engine: QueryEngine::new(),
            index: Mutex::new(index),
        })
    }

    /// Open a store in `data_dir` with default limits.
    pub fn new(data_dir: impl Into<PathBuf>) -> MemoryResult<Self> {
        Self::open(MemoryConfig::with_data_dir(data_dir))
    }

    /// Open a store in `data_dir` with explicit limits.
    pub fn with_limits(
        data_dir: impl Into<PathBuf>,
        max_content_length: usize,
        max_tag_length: usize,
        max_tag_count: usize,
    ) -> MemoryResult<Self> {
        Self::open(MemoryConfig {
            data_dir: data_dir.into(),
            limits: ValidationLimits {
                max_content_length,
                max_tag_length,
                max_tag_count,
            },
        })
    }

    /// The data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Full path of the data file.
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// The limits enforced on writes.
    pub fn limits(&self) -> ValidationLimits {
        self.write_engine.limits()
    }

    // ==================== Safe surface ====================

    /// Add a memory, optionally under a parent. Returns the new ID.
    ///
    /// If the data file cannot be written the insert is undone, leaving the
    /// index as it was before the call.
    pub fn add_safe(
        &self,
        content: &str,
        level: MemoryLevel,
        tags: &[&str],
        parent_id: Option<&str>,
    ) -> MemoryResult<String> {
        let mut index = self.lock();
        let tags = tags.iter().map(|t| t.to_string()).collect();
        let id = self
            .write_engine
            .add(&mut index, content, level, tags, parent_id)?;

        if let Err(e) = self.persist(&index) {
            log::warn!("Rolling back add of {id}: {e}");
            index.undo_insert(&id);
            return Err(e);
        }
        log::debug!("Added memory {id} ({level})");
        Ok(id)
    }

    /// Fetch a memory by ID, recording the access.
    pub fn get_safe(&self, id: &str) -> MemoryResult<MemoryEntry> {
        let mut index = self.lock();
        let entry = self.write_engine.touch(&mut index, id)?;
        self.persist(&index)?;
        Ok(entry)
    }

    /// Apply the fields set in `update` and record an access.
    ///
    /// A persistence failure is returned but the in-memory change is kept;
    /// the next successful save brings the file back in line.
    pub fn update_safe(&self, id: &str, update: MemoryUpdate) -> MemoryResult<()> {
        let mut index = self.lock();
        self.write_engine.update(&mut index, id, update)?;
        self.persist(&index)?;
        log::debug!("Updated memory {id}");
        Ok(())
    }

    /// Delete a memory and all of its descendants. Returns how many were removed.
    ///
    /// Like [`update_safe`](Self::update_safe), a persistence failure does not
    /// restore the removed entries.
    pub fn delete_safe(&self, id: &str) -> MemoryResult<usize> {
        let mut index = self.lock();
        let report = self.write_engine.delete(&mut index, id)?;
        self.persist(&index)?;
        log::debug!(
            "Deleted memory {id} with {} descendants",
            report.removed_ids.len().saturating_sub(1)
        );
        Ok(report.removed_ids.len())
    }

    /// Move a memory under `new_parent`, or make it a root with `None`.
    ///
    /// Refuses to make a memory its own ancestor. Undone if the data file
    /// cannot be written.
    pub fn move_memory(&self, id: &str, new_parent: Option<&str>) -> MemoryResult<()> {
        let mut index = self.lock();
        let old_parent = self.write_engine.move_entry(&mut index, id, new_parent)?;

        if let Err(e) = self.persist(&index) {
            log::warn!("Rolling back move of {id}: {e}");
            index.set_parent(id, old_parent.as_deref())?;
            return Err(e);
        }
        Ok(())
    }

    /// Write the full index to the data file.
    pub fn save(&self) -> MemoryResult<()> {
        let index = self.lock();
        self.persist(&index)
    }

    // ==================== Legacy surface ====================

    /// Add a memory, panicking on any failure.
    pub fn add(
        &self,
        content: &str,
        level: MemoryLevel,
        tags: &[&str],
        parent_id: Option<&str>,
    ) -> String {
        match self.add_safe(content, level, tags, parent_id) {
            Ok(id) => id,
            Err(e) => panic!("add failed: {e}"),
        }
    }

    /// Fetch a memory by ID, recording the access. `None` if unknown.
    ///
    /// Panics if the access cannot be persisted.
    pub fn get(&self, id: &str) -> Option<MemoryEntry> {
        match self.get_safe(id) {
            Ok(entry) => Some(entry),
            Err(MemoryError::MemoryNotFound(_)) => None,
            Err(e) => panic!("get failed: {e}"),
        }
    }

    /// Update a memory. `false` if unknown; panics on any other failure.
    pub fn update(&self, id: &str, update: MemoryUpdate) -> bool {
        match self.update_safe(id, update) {
            Ok(()) => true,
            Err(MemoryError::MemoryNotFound(_)) => false,
            Err(e) => panic!("update failed: {e}"),
        }
    }

    /// Delete a memory subtree. `false` if unknown; panics on any other failure.
    pub fn delete(&self, id: &str) -> bool {
        match self.delete_safe(id) {
            Ok(_) => true,
            Err(MemoryError::MemoryNotFound(_)) => false,
            Err(e) => panic!("delete failed: {e}"),
        }
    }

    // ==================== Search ====================

    /// Memories carrying every given tag. An empty list matches every memory.
    pub fn search_by_tags(&self, tags: &[&str]) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::AllTags(to_owned(tags)))
    }

    /// Memories carrying any given tag. An empty list matches nothing,
    /// unlike [`search_by_tags`](Self::search_by_tags).
    pub fn search_by_tags_or(&self, tags: &[&str]) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::AnyTag(to_owned(tags)))
    }

    /// Memories whose content contains `needle`, ignoring case.
    pub fn search_by_content(&self, needle: &str) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::Content(needle.to_string()))
    }

    /// Memories whose content matches a regular expression.
    ///
    /// An invalid pattern fails with `InvalidContent` before anything is touched.
    pub fn search_by_content_regex(&self, pattern: &str) -> MemoryResult<Vec<MemoryEntry>> {
        let filter = MemoryFilter::regex(pattern)?;
        self.search(&filter)
    }

    /// Memories at one level.
    pub fn get_by_level(&self, level: MemoryLevel) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::Level(level))
    }

    /// Memories created between `start` and `end`, both inclusive.
    pub fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::CreatedBetween { start, end })
    }

    // ==================== Hierarchy ====================

    /// Direct children of `id`. Empty if `id` is unknown.
    pub fn get_children(&self, id: &str) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::ChildrenOf(id.to_string()))
    }

    /// Memories without a parent.
    pub fn get_roots(&self) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::Roots)
    }

    /// Every memory.
    pub fn get_all(&self) -> MemoryResult<Vec<MemoryEntry>> {
        self.search(&MemoryFilter::All)
    }

    /// Every ID mapped to its children. Records no access.
    pub fn get_hierarchy(&self) -> BTreeMap<String, Vec<String>> {
        self.lock().hierarchy()
    }

    // ==================== Analytics ====================

    /// The `limit` most accessed memories, highest count first.
    pub fn get_most_accessed(&self, limit: usize) -> MemoryResult<Vec<MemoryEntry>> {
        self.ranked(RankBy::MostAccessed, limit)
    }

    /// The `limit` most recently accessed memories, latest first.
    pub fn get_recently_accessed(&self, limit: usize) -> MemoryResult<Vec<MemoryEntry>> {
        self.ranked(RankBy::RecentlyAccessed, limit)
    }

    /// Counts per level, total accesses and root count. Records no access.
    pub fn get_memory_stats(&self) -> MemoryStats {
        let index = self.lock();
        self.query_engine.stats(&index)
    }

    /// Number of memories.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no memories.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Whether a memory with this ID exists. Records no access.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    // ==================== Internals ====================

    fn lock(&self) -> MutexGuard<'_, MemoryIndex> {
        // Legacy wrappers panic only after the guard is dropped.
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, index: &MemoryIndex) -> MemoryResult<()> {
        MemoryWriter::write_to_file(index, &self.data_file).map_err(|e| {
            log::error!("Failed to save {}: {e}", self.data_file.display());
            e
        })
    }

    /// Select, touch every match, persist once.
    fn search(&self, filter: &MemoryFilter) -> MemoryResult<Vec<MemoryEntry>> {
        let mut index = self.lock();
        let ids = self.query_engine.select(&index, filter);
        self.touch_and_persist(&mut index, &ids)
    }

    fn ranked(&self, by: RankBy, limit: usize) -> MemoryResult<Vec<MemoryEntry>> {
        let mut index = self.lock();
        let ids = self.query_engine.rank(&index, by, limit);
        self.touch_and_persist(&mut index, &ids)
    }

    fn touch_and_persist(
        &self,
        index: &mut MemoryIndex,
        ids: &[String],
    ) -> MemoryResult<Vec<MemoryEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = self.query_engine.touch_all(index, ids);
        self.persist(index)?;
        Ok(results)
    }
}

fn to_owned(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}
