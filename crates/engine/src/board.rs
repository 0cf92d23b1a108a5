#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use pw_core::plan::Plan;

use crate::status::{NodeStatus, RunStatus};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    UnknownNode { id: i64 },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode { id } => write!(f, "no node with id {id} in this snapshot"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Immutable view of a finalized plan: the ordered `(id, thread_id)`
/// sequence and the thread index map. This is everything the engine is
/// allowed to read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanSnapshot {
    nodes: Vec<(i64, String)>,
    thread_indices: BTreeMap<String, i64>,
}

impl PlanSnapshot {
    pub fn of(plan: &Plan) -> Self {
        Self {
            nodes: plan
                .nodes()
                .iter()
                .map(|node| (node.id, node.thread_id.clone()))
                .collect(),
            thread_indices: plan.thread_index_map(),
        }
    }

    pub fn node_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.nodes.iter().map(|(id, _)| *id)
    }

    pub fn thread_of(&self, id: i64) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(node_id, _)| *node_id == id)
            .map(|(_, thread)| thread.as_str())
    }

    pub fn thread_indices(&self) -> &BTreeMap<String, i64> {
        &self.thread_indices
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionProgress {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Per-node status bookkeeping for one run over one snapshot. The engine's
/// single write path; presentation's single status read path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionBoard {
    snapshot: PlanSnapshot,
    statuses: BTreeMap<i64, NodeStatus>,
}

impl ExecutionBoard {
    pub fn new(snapshot: PlanSnapshot) -> Self {
        let statuses = snapshot
            .node_ids()
            .map(|id| (id, NodeStatus::Pending))
            .collect();
        Self { snapshot, statuses }
    }

    pub fn snapshot(&self) -> &PlanSnapshot {
        &self.snapshot
    }

    /// Records the engine's status report for one node.
    pub fn record_status(&mut self, id: i64, status: NodeStatus) -> Result<(), EngineError> {
        match self.statuses.get_mut(&id) {
            Some(slot) => {
                *slot = status;
                Ok(())
            }
            None => Err(EngineError::UnknownNode { id }),
        }
    }

    pub fn status_of(&self, id: i64) -> Option<NodeStatus> {
        self.statuses.get(&id).copied()
    }

    /// The next node the engine would run: lowest pending id, matching the
    /// plan's execution order.
    pub fn next_pending(&self) -> Option<i64> {
        self.statuses
            .iter()
            .find(|(_, status)| **status == NodeStatus::Pending)
            .map(|(id, _)| *id)
    }

    pub fn progress(&self) -> ExecutionProgress {
        let mut progress = ExecutionProgress {
            total: self.statuses.len(),
            ..ExecutionProgress::default()
        };
        for status in self.statuses.values() {
            match status {
                NodeStatus::Pending => progress.pending += 1,
                NodeStatus::Running => progress.running += 1,
                NodeStatus::Completed => progress.completed += 1,
                NodeStatus::Failed => progress.failed += 1,
            }
        }
        progress
    }

    /// Any failure wins, then activity, then remaining work.
    pub fn overall_status(&self) -> RunStatus {
        let progress = self.progress();
        if progress.failed > 0 {
            RunStatus::Failed
        } else if progress.running > 0 {
            RunStatus::Running
        } else if progress.pending > 0 {
            RunStatus::Pending
        } else {
            RunStatus::Completed
        }
    }

    /// Forgets all reported statuses, e.g. after the external run is
    /// cancelled. The snapshot (and the plan behind it) is untouched.
    pub fn reset(&mut self) {
        for status in self.statuses.values_mut() {
            *status = NodeStatus::Pending;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pw_core::plan::NodeDraft;

    fn board() -> ExecutionBoard {
        let mut plan = Plan::new();
        plan.add_node(NodeDraft::default()).unwrap();
        plan.add_node(NodeDraft::default()).unwrap();
        ExecutionBoard::new(PlanSnapshot::of(&plan))
    }

    #[test]
    fn statuses_start_pending_and_step_in_id_order() {
        let mut board = board();
        assert_eq!(board.next_pending(), Some(1));
        board.record_status(1, NodeStatus::Completed).unwrap();
        assert_eq!(board.next_pending(), Some(2));
        board.record_status(2, NodeStatus::Completed).unwrap();
        board.record_status(3, NodeStatus::Completed).unwrap();
        assert_eq!(board.next_pending(), None);
        assert_eq!(board.overall_status(), RunStatus::Completed);
    }

    #[test]
    fn unknown_node_is_rejected() {
        let mut board = board();
        assert_eq!(
            board.record_status(9, NodeStatus::Running),
            Err(EngineError::UnknownNode { id: 9 })
        );
    }

    #[test]
    fn overall_status_precedence() {
        let mut board = board();
        assert_eq!(board.overall_status(), RunStatus::Pending);
        board.record_status(1, NodeStatus::Running).unwrap();
        assert_eq!(board.overall_status(), RunStatus::Running);
        board.record_status(2, NodeStatus::Failed).unwrap();
        assert_eq!(board.overall_status(), RunStatus::Failed);

        board.reset();
        assert_eq!(board.overall_status(), RunStatus::Pending);
        assert_eq!(board.progress().pending, 3);
    }

    #[test]
    fn snapshot_exposes_threads_and_indices() {
        let mut plan = Plan::new();
        let branch = plan.create_branch(1).unwrap();
        let snapshot = PlanSnapshot::of(&plan);

        assert_eq!(snapshot.node_count(), 2);
        assert_eq!(snapshot.thread_of(1), Some("main"));
        assert_eq!(
            snapshot.thread_of(branch),
            plan.node(branch).map(|n| n.thread_id.as_str())
        );
        assert_eq!(snapshot.thread_indices().get("main"), Some(&0));
    }
}
