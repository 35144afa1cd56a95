//! Mutation pipeline: the write engine.
//!
//! Every method here changes only the in-memory index. Persisting the result,
//! and rolling back when persistence fails, is the caller's job.

use crate::graph::{detect_cycle, MemoryIndex};
use crate::types::{
    validate_content, validate_tags, MemoryEntry, MemoryEntryBuilder, MemoryError, MemoryLevel,
    MemoryResult, ValidationLimits,
};

/// Fields to change in an update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct MemoryUpdate {
    pub content: Option<String>,
    pub level: Option<MemoryLevel>,
    pub tags: Option<Vec<String>>,
}

impl MemoryUpdate {
    /// Create an update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Replace the level.
    pub fn level(mut self, level: MemoryLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Replace the tags.
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = Some(tags.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.level.is_none() && self.tags.is_none()
    }
}

/// Report from a subtree deletion.
#[derive(Debug)]
pub struct DeleteReport {
    /// IDs removed, deepest first; the requested ID is last.
    pub removed_ids: Vec<String>,
}

/// The write engine validates input and applies mutations to an index.
pub struct WriteEngine {
    limits: ValidationLimits,
}

impl WriteEngine {
    /// Create a new write engine enforcing the given limits.
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// The limits this engine enforces.
    pub fn limits(&self) -> ValidationLimits {
        self.limits
    }

    /// Validate and insert a new memory, returning its ID.
    pub fn add(
        &self,
        index: &mut MemoryIndex,
        content: &str,
        level: MemoryLevel,
        tags: Vec<String>,
        parent_id: Option<&str>,
    ) -> MemoryResult<String> {
        self.limits.validate(content, &tags)?;

        let entry = MemoryEntryBuilder::new(level, content)
            .tags(tags)
            .parent_id(parent_id.map(str::to_string))
            .build();

        if let Some(parent_id) = parent_id {
            if !index.contains(parent_id) {
                return Err(MemoryError::ParentNotFound(parent_id.to_string()));
            }
            // A fresh ID cannot be an ancestor yet; the check still guards
            // against a corrupt chain above the parent.
            if detect_cycle(index, parent_id, &entry.id) {
                return Err(MemoryError::CircularDependency(format!(
                    "attaching {} under {}",
                    entry.id, parent_id
                )));
            }
        }

        let id = entry.id.clone();
        index.insert(entry)?;
        Ok(id)
    }

    /// Apply the provided fields and record an access.
    pub fn update(
        &self,
        index: &mut MemoryIndex,
        id: &str,
        update: MemoryUpdate,
    ) -> MemoryResult<()> {
        if !index.contains(id) {
            return Err(MemoryError::MemoryNotFound(id.to_string()));
        }
        if let Some(content) = &update.content {
            validate_content(content, self.limits.max_content_length)?;
        }
        if let Some(tags) = &update.tags {
            validate_tags(tags, self.limits.max_tag_length, self.limits.max_tag_count)?;
        }

        let entry = index
            .get_mut(id)
            .ok_or_else(|| MemoryError::MemoryNotFound(id.to_string()))?;
        if let Some(content) = update.content {
            entry.content = content;
        }
        if let Some(level) = update.level {
            entry.level = level;
        }
        if let Some(tags) = update.tags {
            entry.tags = tags;
        }
        entry.touch();
        Ok(())
    }

    /// Remove a memory and all of its descendants.
    pub fn delete(&self, index: &mut MemoryIndex, id: &str) -> MemoryResult<DeleteReport> {
        let removed = index
            .remove_subtree(id)
            .ok_or_else(|| MemoryError::MemoryNotFound(id.to_string()))?;
        Ok(DeleteReport {
            removed_ids: removed.into_iter().map(|e| e.id).collect(),
        })
    }

    /// Re-parent a memory, or make it a root when `new_parent` is None.
    ///
    /// Returns the previous parent so the caller can undo the move.
    pub fn move_entry(
        &self,
        index: &mut MemoryIndex,
        id: &str,
        new_parent: Option<&str>,
    ) -> MemoryResult<Option<String>> {
        if !index.contains(id) {
            return Err(MemoryError::MemoryNotFound(id.to_string()));
        }
        if let Some(parent_id) = new_parent {
            if !index.contains(parent_id) {
                return Err(MemoryError::ParentNotFound(parent_id.to_string()));
            }
            if detect_cycle(index, parent_id, id) {
                return Err(MemoryError::CircularDependency(format!(
                    "{parent_id} is {id} or one of its descendants"
                )));
            }
        }
        index.set_parent(id, new_parent)
    }

    /// Record an access on one memory and return a copy of it.
    pub fn touch(&self, index: &mut MemoryIndex, id: &str) -> MemoryResult<MemoryEntry> {
        let entry = index
            .get_mut(id)
            .ok_or_else(|| MemoryError::MemoryNotFound(id.to_string()))?;
        entry.touch();
        Ok(entry.clone())
    }
}
