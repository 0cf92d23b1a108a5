#![forbid(unsafe_code)]

use std::collections::{BTreeMap, BTreeSet};

use super::error::MutationError;
use super::names::{MAIN_THREAD, ThreadName, ThreadNameError};
use super::node::PlanNode;

/// Authoritative thread bookkeeping for one open plan: thread id →
/// view index, and thread id → member node ids.
///
/// The registry is a plan-scoped value owned by the plan it describes.
/// Opening another plan means constructing another registry; two plans
/// never share one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadRegistry {
    view_indices: BTreeMap<String, i64>,
    members: BTreeMap<String, BTreeSet<i64>>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node to a thread, creating the thread on first sight.
    /// Main takes index 0; any other new thread takes `max(used) + 1`
    /// (1 when nothing is registered yet). Returns the thread's index.
    pub fn register_node(&mut self, node_id: i64, thread_id: &str) -> i64 {
        let index = match self.view_indices.get(thread_id) {
            Some(index) => *index,
            None => self.create_thread(thread_id),
        };
        self.members
            .entry(thread_id.to_string())
            .or_default()
            .insert(node_id);
        index
    }

    /// Removes a node from a thread. An empty non-main thread is deleted
    /// and every higher view index shifts down by one; returns whether the
    /// thread was deleted.
    pub fn unregister_node(&mut self, node_id: i64, thread_id: &str) -> bool {
        let Some(nodes) = self.members.get_mut(thread_id) else {
            return false;
        };
        nodes.remove(&node_id);
        if thread_id != MAIN_THREAD && nodes.is_empty() {
            self.drop_thread_entry(thread_id);
            return true;
        }
        false
    }

    /// Reassigns a node to another thread: unregisters from the source
    /// (with the usual empty-thread cascade) and registers on the
    /// destination, creating it on first sight. Returns the destination's
    /// view index.
    pub fn move_node(&mut self, node_id: i64, from: &str, to: &str) -> i64 {
        self.unregister_node(node_id, from);
        self.register_node(node_id, to)
    }

    /// Deletes a thread outright (with index compaction). Refuses main.
    pub fn remove_thread(&mut self, thread_id: &str) -> Result<(), MutationError> {
        if thread_id == MAIN_THREAD {
            return Err(MutationError::MainThreadProtected);
        }
        if !self.view_indices.contains_key(thread_id) {
            return Err(MutationError::UnknownThread {
                thread_id: thread_id.to_string(),
            });
        }
        self.drop_thread_entry(thread_id);
        Ok(())
    }

    /// Renames a thread, moving both its index and its member set.
    /// Refuses main, unknown source, duplicate or empty target; the
    /// registry is untouched on failure.
    pub fn rename_thread(&mut self, old: &str, new: &str) -> Result<(), MutationError> {
        if old == MAIN_THREAD {
            return Err(MutationError::MainThreadProtected);
        }
        if !self.view_indices.contains_key(old) {
            return Err(MutationError::UnknownThread {
                thread_id: old.to_string(),
            });
        }
        if self.view_indices.contains_key(new) {
            return Err(MutationError::DuplicateThreadName {
                name: new.to_string(),
            });
        }
        let new = match ThreadName::try_new(new) {
            Ok(name) => name,
            Err(ThreadNameError::Empty) => return Err(MutationError::EmptyName),
            Err(reason) => return Err(MutationError::InvalidThreadName(reason)),
        };

        let index = self
            .view_indices
            .remove(old)
            .unwrap_or_default();
        self.view_indices.insert(new.as_str().to_string(), index);
        let nodes = self.members.remove(old).unwrap_or_default();
        self.members.insert(new.into_string(), nodes);
        Ok(())
    }

    /// Thread ids ordered by ascending view index, main first.
    pub fn all_thread_ids(&self) -> Vec<String> {
        let mut threads: Vec<(&String, i64)> = self
            .view_indices
            .iter()
            .map(|(tid, index)| (tid, *index))
            .collect();
        threads.sort_by_key(|(_, index)| *index);
        threads.into_iter().map(|(tid, _)| tid.clone()).collect()
    }

    pub fn view_index_of(&self, thread_id: &str) -> Option<i64> {
        self.view_indices.get(thread_id).copied()
    }

    pub fn thread_exists(&self, thread_id: &str) -> bool {
        self.view_indices.contains_key(thread_id)
    }

    pub fn thread_at_index(&self, index: i64) -> Option<&str> {
        self.view_indices
            .iter()
            .find(|(_, i)| **i == index)
            .map(|(tid, _)| tid.as_str())
    }

    pub fn nodes_in_thread(&self, thread_id: &str) -> BTreeSet<i64> {
        self.members.get(thread_id).cloned().unwrap_or_default()
    }

    /// The serialized form: a copy of the thread id → view index map.
    pub fn index_map(&self) -> BTreeMap<String, i64> {
        self.view_indices.clone()
    }

    pub fn thread_count(&self) -> usize {
        self.view_indices.len()
    }

    pub fn clear(&mut self) {
        self.view_indices.clear();
        self.members.clear();
    }

    /// Adopts a saved index for a still-unseen thread. Refused (returns
    /// false) when the thread is already known or the index is claimed.
    pub(crate) fn seed_index(&mut self, thread_id: &str, index: i64) -> bool {
        if index < 0
            || self.view_indices.contains_key(thread_id)
            || self.thread_at_index(index).is_some()
        {
            return false;
        }
        if (thread_id == MAIN_THREAD) != (index == 0) {
            return false;
        }
        self.view_indices.insert(thread_id.to_string(), index);
        self.members.entry(thread_id.to_string()).or_default();
        true
    }

    /// Re-derives the member sets from the node list. Used after id
    /// renumbering, when every membership entry is stale at once.
    pub(crate) fn rebind_members(&mut self, nodes: &[PlanNode]) {
        self.members.clear();
        for node in nodes {
            self.members
                .entry(node.thread_id.clone())
                .or_default()
                .insert(node.id);
        }
        for thread_id in self.view_indices.keys() {
            self.members.entry(thread_id.clone()).or_default();
        }
    }

    /// Drops non-main threads that ended up with no members (a saved index
    /// map can name threads whose nodes are gone).
    pub(crate) fn prune_empty(&mut self) {
        let empty: Vec<String> = self
            .view_indices
            .keys()
            .filter(|tid| {
                tid.as_str() != MAIN_THREAD
                    && self.members.get(*tid).is_none_or(|nodes| nodes.is_empty())
            })
            .cloned()
            .collect();
        for thread_id in empty {
            self.drop_thread_entry(&thread_id);
        }
    }

    pub(crate) fn swap_indices(&mut self, a: &str, b: &str) {
        let (Some(ia), Some(ib)) = (self.view_index_of(a), self.view_index_of(b)) else {
            return;
        };
        self.view_indices.insert(a.to_string(), ib);
        self.view_indices.insert(b.to_string(), ia);
    }

    /// Compacts view indices to the dense range `0..K`, preserving relative
    /// order with main pinned at 0. No-op on an already-dense registry.
    pub(crate) fn compact(&mut self) {
        let mut ordered: Vec<(String, i64)> = self
            .view_indices
            .iter()
            .map(|(tid, index)| (tid.clone(), *index))
            .collect();
        ordered.sort_by(|a, b| {
            let a_main = a.0 == MAIN_THREAD;
            let b_main = b.0 == MAIN_THREAD;
            b_main.cmp(&a_main).then(a.1.cmp(&b.1))
        });
        for (next, (tid, _)) in ordered.into_iter().enumerate() {
            self.view_indices.insert(tid, next as i64);
        }
    }

    fn create_thread(&mut self, thread_id: &str) -> i64 {
        let index = if thread_id == MAIN_THREAD {
            0
        } else {
            match self.view_indices.values().max() {
                Some(max) => max + 1,
                None => 1,
            }
        };
        self.view_indices.insert(thread_id.to_string(), index);
        self.members.entry(thread_id.to_string()).or_default();
        index
    }

    fn drop_thread_entry(&mut self, thread_id: &str) {
        let Some(deleted) = self.view_indices.remove(thread_id) else {
            return;
        };
        self.members.remove(thread_id);
        for index in self.view_indices.values_mut() {
            if *index > deleted {
                *index -= 1;
            }
        }
    }
}
