//! Core index structure: ID to entry map with eagerly maintained children lists.

use std::collections::BTreeMap;

use crate::types::{MemoryEntry, MemoryError, MemoryResult};

use super::tree;

/// The canonical in-memory state of a store.
///
/// Entries are keyed by ID in a `BTreeMap`, so iteration order is ID order
/// and every query built on it is deterministic. IDs minted by one process
/// sort in creation order (see [`generate_id`](crate::types::generate_id));
/// entries loaded from earlier runs sort by their wall-clock prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryIndex {
    entries: BTreeMap<String, MemoryEntry>,
}

impl MemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Create from pre-existing entries (used by the reader).
    ///
    /// Parent chains are verified: a dangling `parent_id` fails with
    /// `ParentNotFound` and a cycle with `CircularDependency`. Children lists
    /// are then rebuilt from `parent_id` if they disagree with it.
    pub fn from_entries(entries: Vec<MemoryEntry>) -> MemoryResult<Self> {
        let mut index = Self::new();
        for entry in entries {
            if index.entries.contains_key(&entry.id) {
                return Err(MemoryError::JsonParse(format!(
                    "duplicate memory id {}",
                    entry.id
                )));
            }
            index.entries.insert(entry.id.clone(), entry);
        }
        tree::verify_parents(&index)?;
        if !tree::children_consistent(&index) {
            log::warn!("Children lists disagree with parent references; rebuilding them");
            index.rebuild_children();
        }
        Ok(index)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry with this ID exists.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Get an entry by ID (immutable).
    pub fn get(&self, id: &str) -> Option<&MemoryEntry> {
        self.entries.get(id)
    }

    /// Get an entry by ID (mutable).
    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut MemoryEntry> {
        self.entries.get_mut(id)
    }

    /// All entries in creation order.
    pub fn entries(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.entries.values()
    }

    /// All entries in creation order (mutable).
    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut MemoryEntry> {
        self.entries.values_mut()
    }

    /// The underlying map (for serialization).
    pub fn inner(&self) -> &BTreeMap<String, MemoryEntry> {
        &self.entries
    }

    /// Insert a new entry and append it to its parent's children.
    ///
    /// The parent must exist. The caller runs cycle detection first, under the
    /// same lock as this call.
    pub fn insert(&mut self, entry: MemoryEntry) -> MemoryResult<()> {
        if let Some(parent_id) = &entry.parent_id {
            let parent = self
                .entries
                .get_mut(parent_id)
                .ok_or_else(|| MemoryError::ParentNotFound(parent_id.clone()))?;
            parent.children.push(entry.id.clone());
        }
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    /// Undo an [`insert`](Self::insert): drop the entry and its parent link.
    pub(crate) fn undo_insert(&mut self, id: &str) -> Option<MemoryEntry> {
        let removed = self.entries.remove(id)?;
        if let Some(parent_id) = &removed.parent_id {
            self.unlink_child(parent_id, id);
        }
        Some(removed)
    }

    /// Remove an entry and every descendant, deepest first.
    ///
    /// Returns the removed entries in removal order, or None if `id` is unknown.
    pub fn remove_subtree(&mut self, id: &str) -> Option<Vec<MemoryEntry>> {
        let parent_id = self.entries.get(id)?.parent_id.clone();
        let order = tree::subtree_post_order(self, id);
        let mut removed = Vec::with_capacity(order.len());
        for victim in order {
            if let Some(entry) = self.entries.remove(&victim) {
                removed.push(entry);
            }
        }
        if let Some(parent_id) = parent_id {
            self.unlink_child(&parent_id, id);
        }
        Some(removed)
    }

    /// Move `id` under `new_parent` (or make it a root). Returns the previous parent.
    ///
    /// Cycle detection is the caller's job; this only rewires both sides.
    pub(crate) fn set_parent(
        &mut self,
        id: &str,
        new_parent: Option<&str>,
    ) -> MemoryResult<Option<String>> {
        if let Some(parent_id) = new_parent {
            if !self.entries.contains_key(parent_id) {
                return Err(MemoryError::ParentNotFound(parent_id.to_string()));
            }
        }
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| MemoryError::MemoryNotFound(id.to_string()))?;
        let old_parent = entry.parent_id.take();
        entry.parent_id = new_parent.map(str::to_string);

        if let Some(old) = &old_parent {
            self.unlink_child(old, id);
        }
        if let Some(parent_id) = new_parent {
            if let Some(parent) = self.entries.get_mut(parent_id) {
                parent.children.push(id.to_string());
            }
        }
        Ok(old_parent)
    }

    /// Snapshot of every ID mapped to its children list.
    pub fn hierarchy(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.children.clone()))
            .collect()
    }

    fn unlink_child(&mut self, parent_id: &str, child_id: &str) {
        if let Some(parent) = self.entries.get_mut(parent_id) {
            parent.children.retain(|c| c != child_id);
        }
    }

    /// Rebuild every children list from `parent_id` references.
    fn rebuild_children(&mut self) {
        let links: Vec<(String, String)> = self
            .entries
            .values()
            .filter_map(|e| e.parent_id.clone().map(|p| (p, e.id.clone())))
            .collect();
        for entry in self.entries.values_mut() {
            entry.children.clear();
        }
        for (parent_id, child_id) in links {
            if let Some(parent) = self.entries.get_mut(&parent_id) {
                parent.children.push(child_id);
            }
        }
    }
}
