#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::board::ExecutionBoard;
use crate::status::{NodeStatus, RunStatus};

/// One status report from the engine, as it arrives on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub node_id: i64,
    pub status: NodeStatus,
}

/// One per-node row of the board, as handed to presentation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStateRecord {
    pub node_id: i64,
    pub thread_id: String,
    pub status: NodeStatus,
}

/// The whole board, as handed to presentation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardStateReport {
    pub overall_status: RunStatus,
    pub node_states: Vec<BoardStateRecord>,
}

impl BoardStateReport {
    pub fn of(board: &ExecutionBoard) -> Self {
        Self {
            overall_status: board.overall_status(),
            node_states: board
                .snapshot()
                .node_ids()
                .map(|id| BoardStateRecord {
                    node_id: id,
                    thread_id: board
                        .snapshot()
                        .thread_of(id)
                        .unwrap_or_default()
                        .to_string(),
                    status: board.status_of(id).unwrap_or_default(),
                })
                .collect(),
        }
    }
}
