#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use super::names::MAIN_THREAD;
use super::node::PlanNode;
use super::registry::ThreadRegistry;

/// An execution plan: the ordered node list plus its thread registry.
///
/// List position defines node identity, the first node is always on main,
/// and thread view indices form a dense range with main at 0. Every
/// constructor and mutation re-establishes these invariants;
/// callers serialize structural edits per open plan (no interior locking).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    nodes: Vec<PlanNode>,
    registry: ThreadRegistry,
}

impl Plan {
    /// A fresh plan holding only the main-start node.
    pub fn new() -> Self {
        Self::load(Vec::new(), &BTreeMap::new())
    }

    /// Builds a plan from saved or externally supplied records, running the
    /// full reconciliation pass. Malformed identity data (missing, negative
    /// or duplicate ids, inconsistent view indices) is repaired, not
    /// rejected; the pass is idempotent on its own output.
    pub fn load(nodes: Vec<PlanNode>, saved_indices: &BTreeMap<String, i64>) -> Self {
        let mut plan = Self {
            nodes,
            registry: ThreadRegistry::new(),
        };
        plan.reconcile(saved_indices);
        plan
    }

    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    pub fn node(&self, id: i64) -> Option<&PlanNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn registry(&self) -> &ThreadRegistry {
        &self.registry
    }

    /// The serialized thread index map, always reconciled.
    pub fn thread_index_map(&self) -> BTreeMap<String, i64> {
        self.registry.index_map()
    }

    /// Load-time reconciliation (also the repair pass before persisting).
    ///
    /// 1. Inserts the synthetic main-start node when the list is empty or
    ///    does not start on main.
    /// 2. Reassigns ids by list position (1-indexed) and remaps
    ///    `parent_id` references through the old→new id mapping.
    /// 3. Resolves one view index per thread: a node's stored index is
    ///    adopted for a still-unseen thread when the slot is free,
    ///    otherwise the next free index is assigned (main → 0).
    /// 4. Compacts indices to a dense `0..K` range, main pinned at 0.
    /// 5. Drops `data_in_thread` references to threads absent from the
    ///    plan, then overwrites every node's index and derived coordinates.
    pub(crate) fn reconcile(&mut self, saved_indices: &BTreeMap<String, i64>) {
        self.registry.clear();

        let starts_on_main = self
            .nodes
            .first()
            .is_some_and(|node| node.thread_id == MAIN_THREAD);
        if !starts_on_main {
            self.nodes.insert(0, PlanNode::main_start());
        }

        // Saved map entries seed first, lowest index winning a contested slot.
        let mut seeds: Vec<(&String, i64)> = saved_indices
            .iter()
            .map(|(tid, index)| (tid, *index))
            .collect();
        seeds.sort_by_key(|(_, index)| *index);
        for (thread_id, index) in seeds {
            self.registry.seed_index(thread_id, index);
        }

        let mut old_id_map: BTreeMap<i64, i64> = BTreeMap::new();
        for position in 0..self.nodes.len() {
            let new_id = position as i64 + 1;
            let (old_id, thread_id, stored_index) = {
                let node = &self.nodes[position];
                (node.id, node.thread_id.clone(), node.thread_view_index)
            };
            if old_id > 0 {
                old_id_map.insert(old_id, new_id);
            }
            let carries_index =
                stored_index > 0 || (thread_id == MAIN_THREAD && stored_index == 0);
            if carries_index && !self.registry.thread_exists(&thread_id) {
                self.registry.seed_index(&thread_id, stored_index);
            }
            self.registry.register_node(new_id, &thread_id);
            self.nodes[position].id = new_id;
        }

        self.registry.prune_empty();
        self.registry.compact();

        let resolved = self.registry.index_map();
        for node in &mut self.nodes {
            node.parent_id = node
                .parent_id
                .and_then(|old| old_id_map.get(&old).copied());
            if node
                .data_in_thread
                .as_ref()
                .is_some_and(|tid| !resolved.contains_key(tid))
            {
                node.data_in_thread = None;
                node.data_in_slice = None;
            }
            node.thread_view_index = resolved.get(&node.thread_id).copied().unwrap_or(0);
            node.refresh_position();
        }
    }

    /// Re-derives registry membership from the node list after ids changed.
    pub(crate) fn rebind_members(&mut self) {
        self.registry.rebind_members(&self.nodes);
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<PlanNode> {
        &mut self.nodes
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ThreadRegistry {
        &mut self.registry
    }

    /// Rewrites every node's view index and coordinates from the registry.
    pub(crate) fn refresh_derived(&mut self) {
        let resolved = self.registry.index_map();
        for node in &mut self.nodes {
            node.thread_view_index = resolved.get(&node.thread_id).copied().unwrap_or(0);
            node.refresh_position();
        }
    }
}
