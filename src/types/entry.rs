//! Memory levels and the core entry struct.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, now_seconds};

/// Retention tier of a memory. Purely descriptive: nothing expires automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryLevel {
    /// Scratch context for the current task.
    ShortTerm,
    /// Context worth keeping across a few tasks.
    MediumTerm,
    /// Durable knowledge.
    LongTerm,
}

impl MemoryLevel {
    /// All levels, shortest retention first.
    pub const ALL: [MemoryLevel; 3] = [Self::ShortTerm, Self::MediumTerm, Self::LongTerm];

    /// Return a human-readable name for this level.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        }
    }

    /// Parse a level from its name or one of its abbreviations, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "shortterm" | "short_term" | "short-term" | "short" | "st" => Some(Self::ShortTerm),
            "mediumterm" | "medium_term" | "medium-term" | "medium" | "mt" => {
                Some(Self::MediumTerm)
            }
            "longterm" | "long_term" | "long-term" | "long" | "lt" => Some(Self::LongTerm),
            _ => None,
        }
    }
}

impl std::fmt::Display for MemoryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single memory record. Parent and children are held as IDs and resolved
/// through the store, never as pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Unique identifier, fixed at creation.
    pub id: String,
    /// The stored text.
    pub content: String,
    /// Retention tier.
    pub level: MemoryLevel,
    /// Ordered tags, each `[A-Za-z0-9_-]+`.
    pub tags: Vec<String>,
    /// When this memory was created.
    #[serde(with = "super::timestamp_format")]
    pub created_at: DateTime<Utc>,
    /// When this memory was last read through the store.
    #[serde(with = "super::timestamp_format")]
    pub last_accessed: DateTime<Utc>,
    /// How many times this memory has been read through the store.
    pub access_count: u64,
    /// The parent memory, if any.
    pub parent_id: Option<String>,
    /// IDs of the memories whose `parent_id` is this entry.
    pub children: Vec<String>,
}

impl MemoryEntry {
    /// Create a fresh entry with a newly generated ID.
    pub fn new(
        content: impl Into<String>,
        level: MemoryLevel,
        tags: Vec<String>,
        parent_id: Option<String>,
    ) -> Self {
        MemoryEntryBuilder::new(level, content)
            .tags(tags)
            .parent_id(parent_id)
            .build()
    }

    /// Record a read-style access.
    pub(crate) fn touch(&mut self) {
        self.access_count += 1;
        self.last_accessed = now_seconds();
    }

    /// Whether this entry carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether this entry has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Builder for constructing MemoryEntry instances ergonomically.
pub struct MemoryEntryBuilder {
    level: MemoryLevel,
    content: String,
    tags: Vec<String>,
    parent_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl MemoryEntryBuilder {
    /// Create a new builder with the required fields.
    pub fn new(level: MemoryLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
            tags: Vec::new(),
            parent_id: None,
            created_at: None,
        }
    }

    /// Set the tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the parent ID.
    pub fn parent_id(mut self, parent_id: Option<String>) -> Self {
        self.parent_id = parent_id;
        self
    }

    /// Set the creation timestamp.
    pub fn created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Build the entry, assigning a fresh ID.
    pub fn build(self) -> MemoryEntry {
        let now = self.created_at.unwrap_or_else(now_seconds);
        MemoryEntry {
            id: generate_id(),
            content: self.content,
            level: self.level,
            tags: self.tags,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            parent_id: self.parent_id,
            children: Vec::new(),
        }
    }
}
