//! Query executor: filters, rankings and statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use crate::graph::MemoryIndex;
use crate::types::{MemoryEntry, MemoryError, MemoryLevel, MemoryResult};

/// Which entries a search selects.
#[derive(Debug, Clone)]
pub enum MemoryFilter {
    /// Entries carrying every listed tag. An empty list selects everything.
    AllTags(Vec<String>),
    /// Entries carrying at least one listed tag. An empty list selects nothing.
    AnyTag(Vec<String>),
    /// Case-insensitive substring of the content.
    Content(String),
    /// Regular expression matched against the content.
    ContentRegex(Regex),
    /// Entries at one level.
    Level(MemoryLevel),
    /// Entries created within `[start, end]`, both ends inclusive.
    CreatedBetween {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Direct children of one entry. Unknown IDs select nothing.
    ChildrenOf(String),
    /// Entries without a parent.
    Roots,
    /// Every entry.
    All,
}

impl MemoryFilter {
    /// Compile a regex filter; a bad pattern is an `InvalidContent` error.
    pub fn regex(pattern: &str) -> MemoryResult<Self> {
        Regex::new(pattern)
            .map(Self::ContentRegex)
            .map_err(|e| MemoryError::InvalidContent(format!("invalid regex {pattern:?}: {e}")))
    }

    fn matches(&self, entry: &MemoryEntry) -> bool {
        match self {
            Self::AllTags(tags) => tags.iter().all(|t| entry.has_tag(t)),
            Self::AnyTag(tags) => tags.iter().any(|t| entry.has_tag(t)),
            Self::Content(needle) => entry
                .content
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::ContentRegex(re) => re.is_match(&entry.content),
            Self::Level(level) => entry.level == *level,
            Self::CreatedBetween { start, end } => {
                entry.created_at >= *start && entry.created_at <= *end
            }
            Self::ChildrenOf(parent_id) => entry.parent_id.as_deref() == Some(parent_id.as_str()),
            Self::Roots => entry.is_root(),
            Self::All => true,
        }
    }
}

/// Sort order for ranking queries. Ties keep creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    /// Highest access count first.
    MostAccessed,
    /// Latest access first.
    RecentlyAccessed,
}

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Total number of memories.
    pub total: usize,
    /// Number of memories at each level.
    pub by_level: HashMap<MemoryLevel, usize>,
    /// Sum of every access count.
    pub total_accesses: u64,
    /// Number of memories without a parent.
    pub root_count: usize,
}

impl MemoryStats {
    /// Count at one level (zero if none).
    pub fn count(&self, level: MemoryLevel) -> usize {
        self.by_level.get(&level).copied().unwrap_or(0)
    }
}

/// The query engine selects and ranks entries in an index.
pub struct QueryEngine;

impl QueryEngine {
    /// Create a new query engine.
    pub fn new() -> Self {
        Self
    }

    /// IDs of matching entries, in creation order.
    pub fn select(&self, index: &MemoryIndex, filter: &MemoryFilter) -> Vec<String> {
        if let MemoryFilter::ChildrenOf(parent_id) = filter {
            // The eager children list already holds the answer.
            return index
                .get(parent_id)
                .map(|e| e.children.clone())
                .unwrap_or_default();
        }
        index
            .entries()
            .filter(|e| filter.matches(e))
            .map(|e| e.id.clone())
            .collect()
    }

    /// IDs of the top `limit` entries by the given order.
    ///
    /// The sort is stable over creation order, so equal keys keep that order.
    pub fn rank(&self, index: &MemoryIndex, by: RankBy, limit: usize) -> Vec<String> {
        let mut candidates: Vec<&MemoryEntry> = index.entries().collect();
        match by {
            RankBy::MostAccessed => {
                candidates.sort_by(|a, b| b.access_count.cmp(&a.access_count));
            }
            RankBy::RecentlyAccessed => {
                candidates.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
            }
        }
        candidates.truncate(limit);
        candidates.into_iter().map(|e| e.id.clone()).collect()
    }

    /// Record an access on each listed entry and return copies in list order.
    pub fn touch_all(&self, index: &mut MemoryIndex, ids: &[String]) -> Vec<MemoryEntry> {
        let mut touched = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = index.get_mut(id) {
                entry.touch();
                touched.push(entry.clone());
            }
        }
        touched
    }

    /// Aggregate statistics. Does not record any access.
    pub fn stats(&self, index: &MemoryIndex) -> MemoryStats {
        let mut by_level: HashMap<MemoryLevel, usize> =
            MemoryLevel::ALL.iter().map(|&l| (l, 0)).collect();
        let mut total_accesses = 0u64;
        let mut root_count = 0usize;

        for entry in index.entries() {
            *by_level.entry(entry.level).or_default() += 1;
            total_accesses += entry.access_count;
            if entry.is_root() {
                root_count += 1;
            }
        }

        MemoryStats {
            total: index.len(),
            by_level,
            total_accesses,
            root_count,
        }
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new()
    }
}
