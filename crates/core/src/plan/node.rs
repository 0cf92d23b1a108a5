#![forbid(unsafe_code)]

use super::layout::{node_x, thread_y};
use super::names::MAIN_THREAD;

/// One task node of an execution plan.
///
/// `id` is 1-indexed and dense across the whole plan; `thread_view_index`
/// is shared by every node of a thread (main = 0). `x`/`y` are derived and
/// refreshed after each mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanNode {
    pub id: i64,
    pub node_name: String,
    pub node_type: String,
    pub task_prompt: String,
    pub thread_id: String,
    pub thread_view_index: i64,
    /// Predecessor node that spawned this node. Branch bookkeeping only,
    /// not an ownership edge.
    pub parent_id: Option<i64>,
    /// Thread this node's thread branched from.
    pub parent_thread_id: Option<String>,
    /// Another thread whose message history is consumed as extra input.
    pub data_in_thread: Option<String>,
    /// Slice of the consumed history; `(-1, None)` means "latest message".
    pub data_in_slice: Option<(i64, Option<i64>)>,
    /// Marks that this node's output merges back into its parent thread.
    pub data_out: bool,
    pub x: i64,
    pub y: i64,
}

impl PlanNode {
    pub fn refresh_position(&mut self) {
        self.x = node_x(self.id);
        self.y = thread_y(self.thread_view_index);
    }

    /// Synthetic first node inserted when a loaded plan does not start on main.
    pub(crate) fn main_start() -> Self {
        let mut node = Self {
            id: 1,
            node_name: "Main Start".to_string(),
            node_type: "llm-first".to_string(),
            task_prompt: "Start of main thread".to_string(),
            thread_id: MAIN_THREAD.to_string(),
            thread_view_index: 0,
            parent_id: None,
            parent_thread_id: None,
            data_in_thread: None,
            data_in_slice: None,
            data_out: false,
            x: 0,
            y: 0,
        };
        node.refresh_position();
        node
    }
}

/// Input for `Plan::add_node`. Identity and layout are assigned by the plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeDraft {
    pub node_name: String,
    pub node_type: String,
    pub task_prompt: String,
    /// Defaults to the main thread when absent.
    pub thread_id: Option<String>,
    pub parent_id: Option<i64>,
    pub parent_thread_id: Option<String>,
    pub data_in_thread: Option<String>,
    pub data_in_slice: Option<(i64, Option<i64>)>,
    pub data_out: bool,
}
