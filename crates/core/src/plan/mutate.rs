#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use super::error::MutationError;
use super::model::Plan;
use super::names::{MAIN_THREAD, ThreadName, ThreadNameError};
use super::node::{NodeDraft, PlanNode};

/// Topology operations. Each one re-establishes the plan invariants before
/// returning: dense ids, dense thread indices, refreshed membership and
/// derived coordinates. All are synchronous and total; rejections come back
/// as `MutationError`, never as panics.
impl Plan {
    /// Appends a node with the next id. The draft's thread defaults to
    /// main; a new thread id is created on first use.
    pub fn add_node(&mut self, draft: NodeDraft) -> Result<i64, MutationError> {
        let thread_id = match draft.thread_id {
            Some(tid) => match ThreadName::try_new(tid) {
                Ok(name) => name.into_string(),
                Err(ThreadNameError::Empty) => return Err(MutationError::EmptyName),
                Err(reason) => return Err(MutationError::InvalidThreadName(reason)),
            },
            None => MAIN_THREAD.to_string(),
        };
        if let Some(source) = &draft.data_in_thread {
            if !self.registry().thread_exists(source) {
                return Err(MutationError::UnknownThread {
                    thread_id: source.clone(),
                });
            }
        }

        let id = self.node_count() as i64 + 1;
        let thread_view_index = self.registry_mut().register_node(id, &thread_id);
        let mut node = PlanNode {
            id,
            node_name: draft.node_name,
            node_type: draft.node_type,
            task_prompt: draft.task_prompt,
            thread_id,
            thread_view_index,
            parent_id: draft.parent_id,
            parent_thread_id: draft.parent_thread_id,
            data_in_thread: draft.data_in_thread,
            data_in_slice: draft.data_in_slice,
            data_out: draft.data_out,
            x: 0,
            y: 0,
        };
        node.refresh_position();
        self.nodes_mut().push(node);
        Ok(id)
    }

    /// Removes a node; every surviving node with a larger id shifts down by
    /// one. An unknown id is a no-op. Node 1 (the main-start position) is
    /// protected.
    pub fn delete_node(&mut self, id: i64) -> Result<(), MutationError> {
        if id == 1 {
            return Err(MutationError::ProtectedNode);
        }
        let Some(position) = self.nodes().iter().position(|node| node.id == id) else {
            return Ok(());
        };

        let removed = self.nodes_mut().remove(position);
        let thread_deleted = self
            .registry_mut()
            .unregister_node(removed.id, &removed.thread_id);
        if thread_deleted {
            for node in self.nodes_mut().iter_mut() {
                if node.data_in_thread.as_deref() == Some(removed.thread_id.as_str()) {
                    node.data_in_thread = None;
                    node.data_in_slice = None;
                }
            }
        }
        self.renumber_dense();
        self.rebind_members();
        self.refresh_derived();
        Ok(())
    }

    /// Exchanges the id of a node with its neighbor (`direction` −1 or +1).
    /// Thread membership and content are untouched; only execution order
    /// moves. Node 1 can be neither source nor target.
    pub fn swap_nodes(&mut self, id: i64, direction: i64) -> Result<(), MutationError> {
        let target = id + direction;
        if id == 1 || target == 1 {
            return Err(MutationError::ProtectedNode);
        }
        if target < 1 {
            return Err(MutationError::InvalidIndex { index: target });
        }
        let source_at = self
            .nodes()
            .iter()
            .position(|node| node.id == id)
            .ok_or(MutationError::UnknownTarget { id })?;
        let target_at = self
            .nodes()
            .iter()
            .position(|node| node.id == target)
            .ok_or(MutationError::UnknownTarget { id: target })?;

        let nodes = self.nodes_mut();
        nodes[source_at].id = target;
        nodes[target_at].id = id;
        nodes.swap(source_at, target_at);
        self.rebind_members();
        self.refresh_derived();
        Ok(())
    }

    /// Exchanges the view indices of a node's thread and the adjacent
    /// thread (`direction` −1 or +1), rewriting every member node of both.
    /// Main is pinned at index 0: it neither moves nor is a valid target.
    pub fn swap_threads(&mut self, id: i64, direction: i64) -> Result<(), MutationError> {
        let node = self
            .node(id)
            .ok_or(MutationError::UnknownTarget { id })?;
        let thread_id = node.thread_id.clone();
        if thread_id == MAIN_THREAD {
            return Err(MutationError::MainThreadProtected);
        }
        let current = self
            .registry()
            .view_index_of(&thread_id)
            .ok_or_else(|| MutationError::UnknownThread {
                thread_id: thread_id.clone(),
            })?;
        let target = current + direction;
        if target < 0 {
            return Err(MutationError::InvalidIndex { index: target });
        }
        let Some(target_thread) = self
            .registry()
            .thread_at_index(target)
            .map(str::to_string)
        else {
            return Err(MutationError::InvalidIndex { index: target });
        };
        if target_thread == MAIN_THREAD {
            return Err(MutationError::MainThreadProtected);
        }

        self.registry_mut().swap_indices(&thread_id, &target_thread);
        self.refresh_derived();
        Ok(())
    }

    /// Removes a node's whole thread: every member node goes, remaining
    /// ids and view indices compact, and dangling data-in references to
    /// the removed thread are cleared. Main refuses.
    pub fn delete_thread(&mut self, id: i64) -> Result<(), MutationError> {
        let node = self
            .node(id)
            .ok_or(MutationError::UnknownTarget { id })?;
        let thread_id = node.thread_id.clone();
        self.registry_mut().remove_thread(&thread_id)?;

        self.nodes_mut().retain(|node| node.thread_id != thread_id);
        for node in self.nodes_mut().iter_mut() {
            if node.data_in_thread.as_deref() == Some(thread_id.as_str()) {
                node.data_in_thread = None;
                node.data_in_slice = None;
            }
        }
        self.renumber_dense();
        self.rebind_members();
        self.refresh_derived();
        Ok(())
    }

    /// Spawns a branch off the given node: a fresh `branch_*` thread at the
    /// next free view index (never main's slot) holding one new node that
    /// records where it came from. Returns the new node's id.
    pub fn create_branch(&mut self, parent_id: i64) -> Result<i64, MutationError> {
        let parent = self
            .node(parent_id)
            .ok_or(MutationError::UnknownTarget { id: parent_id })?;
        let parent_thread = parent.thread_id.clone();

        let next_id = self.node_count() as i64 + 1;
        let mut suffix = next_id;
        let mut thread_id = format!("branch_{suffix}");
        while self.registry().thread_exists(&thread_id) {
            suffix += 1;
            thread_id = format!("branch_{suffix}");
        }

        self.add_node(NodeDraft {
            node_name: "Branch".to_string(),
            node_type: "llm-first".to_string(),
            thread_id: Some(thread_id),
            parent_id: Some(parent_id),
            parent_thread_id: Some(parent_thread),
            ..NodeDraft::default()
        })
    }

    /// Renames a thread and rewrites every node reference to the old name.
    /// The registry enforces the rules (main, unknown, duplicate, empty).
    pub fn rename_thread(&mut self, old: &str, new: &str) -> Result<(), MutationError> {
        self.registry_mut().rename_thread(old, new)?;
        for node in self.nodes_mut().iter_mut() {
            if node.thread_id == old {
                node.thread_id = new.to_string();
            }
            if node.parent_thread_id.as_deref() == Some(old) {
                node.parent_thread_id = Some(new.to_string());
            }
            if node.data_in_thread.as_deref() == Some(old) {
                node.data_in_thread = Some(new.to_string());
            }
        }
        Ok(())
    }

    /// Reassigns ids by list position, remapping parent references.
    fn renumber_dense(&mut self) {
        let mut old_to_new: BTreeMap<i64, i64> = BTreeMap::new();
        for (position, node) in self.nodes_mut().iter_mut().enumerate() {
            let new_id = position as i64 + 1;
            old_to_new.insert(node.id, new_id);
            node.id = new_id;
        }
        for node in self.nodes_mut().iter_mut() {
            node.parent_id = node.parent_id.and_then(|old| old_to_new.get(&old).copied());
        }
    }
}
