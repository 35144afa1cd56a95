//! Forest integrity: cycle detection and subtree walks.

use std::collections::{HashMap, HashSet};

use crate::types::{MemoryError, MemoryResult};

use super::MemoryIndex;

/// Walk the parent chain starting at `parent_id`.
///
/// Returns true if the walk reaches `prospective_child_id` or revisits a node,
/// false if it ends at a root or at an ID the index does not hold.
pub fn detect_cycle(index: &MemoryIndex, parent_id: &str, prospective_child_id: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(parent_id);

    while let Some(id) = current {
        if id == prospective_child_id || !visited.insert(id) {
            return true;
        }
        current = index.get(id).and_then(|e| e.parent_id.as_deref());
    }
    false
}

/// IDs of `root_id` and all its descendants, children before parents.
pub fn subtree_post_order(index: &MemoryIndex, root_id: &str) -> Vec<String> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    // Explicit stack of (id, children_expanded).
    let mut stack: Vec<(String, bool)> = vec![(root_id.to_string(), false)];

    while let Some((id, expanded)) = stack.pop() {
        if expanded {
            order.push(id);
            continue;
        }
        if !visited.insert(id.clone()) {
            continue;
        }
        let children = index
            .get(&id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        stack.push((id, true));
        for child in children.into_iter().rev() {
            stack.push((child, false));
        }
    }
    order
}

/// Check every parent reference: it must resolve, and no chain may loop.
///
/// Each entry is walked at most once: a chain stops as soon as it reaches a
/// root or an entry already known to lead to one.
pub fn verify_parents(index: &MemoryIndex) -> MemoryResult<()> {
    for entry in index.entries() {
        if let Some(parent_id) = entry.parent_id.as_deref() {
            if !index.contains(parent_id) {
                return Err(MemoryError::ParentNotFound(format!(
                    "{parent_id} (parent of {})",
                    entry.id
                )));
            }
        }
    }

    let mut settled: HashSet<&str> = HashSet::with_capacity(index.len());
    for entry in index.entries() {
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut current = Some(entry.id.as_str());

        while let Some(id) = current {
            if settled.contains(id) {
                break;
            }
            if !on_path.insert(id) {
                return Err(MemoryError::CircularDependency(format!(
                    "parent chain of {} loops through {id}",
                    entry.id
                )));
            }
            path.push(id);
            current = index.get(id).and_then(|e| e.parent_id.as_deref());
        }
        settled.extend(path);
    }
    Ok(())
}

/// Whether each children list holds exactly the entries that name it as parent.
pub fn children_consistent(index: &MemoryIndex) -> bool {
    let mut actual: HashMap<&str, Vec<&str>> = HashMap::with_capacity(index.len());
    for entry in index.entries() {
        if let Some(parent_id) = entry.parent_id.as_deref() {
            actual.entry(parent_id).or_default().push(entry.id.as_str());
        }
    }

    for entry in index.entries() {
        let mut listed: Vec<&str> = entry.children.iter().map(String::as_str).collect();
        let mut expected = actual.remove(entry.id.as_str()).unwrap_or_default();
        listed.sort_unstable();
        expected.sort_unstable();
        if listed != expected {
            return false;
        }
    }
    true
}
