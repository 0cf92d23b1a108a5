#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use super::layout::NODE_GAP_X;
use super::names::MAIN_THREAD;
use super::node::PlanNode;

/// Where an edge attaches: a real node (by id) or a virtual merge point
/// (by position in `ConnectionSet::merge_points`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Node(i64),
    Merge(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Consecutive nodes of one thread, in id order.
    Thread,
    /// A node consuming another thread's history.
    DataIn,
    /// A node handing its output to a merge point on its parent thread.
    DataOut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub from: Endpoint,
    pub to: Endpoint,
}

/// Presentation-only marker where a branch thread's output rejoins its
/// parent. Never assigned a node id, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergePoint {
    pub parent_thread_id: String,
    pub source_thread_id: String,
    pub source_node_id: i64,
    pub x: i64,
    pub y: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionSet {
    pub edges: Vec<Connection>,
    pub merge_points: Vec<MergePoint>,
}

/// Recomputes the renderable edge set from scratch. Pure function of the
/// node list; callers re-run it after every structural change instead of
/// patching a previous result.
pub fn derive_connections(nodes: &[PlanNode]) -> ConnectionSet {
    let mut by_id: Vec<&PlanNode> = nodes.iter().collect();
    by_id.sort_by_key(|node| node.id);

    let mut threads: BTreeMap<&str, Vec<&PlanNode>> = BTreeMap::new();
    for node in by_id.iter().copied() {
        threads.entry(node.thread_id.as_str()).or_default().push(node);
    }

    let mut set = ConnectionSet::default();

    for members in threads.values() {
        for pair in members.windows(2) {
            set.edges.push(Connection {
                kind: ConnectionKind::Thread,
                from: Endpoint::Node(pair[0].id),
                to: Endpoint::Node(pair[1].id),
            });
        }
    }

    for node in &by_id {
        if let Some(source_thread) = &node.data_in_thread {
            let source = threads
                .get(source_thread.as_str())
                .into_iter()
                .flatten()
                .filter(|candidate| candidate.id < node.id)
                .max_by_key(|candidate| candidate.id);
            // No qualifying member (all ids at or above the consumer) means
            // no edge, not an error.
            if let Some(source) = source {
                set.edges.push(Connection {
                    kind: ConnectionKind::DataIn,
                    from: Endpoint::Node(source.id),
                    to: Endpoint::Node(node.id),
                });
            }
        }

        if node.data_out {
            // A node with no recorded parent merges into main.
            let parent_thread = node.parent_thread_id.as_deref().unwrap_or(MAIN_THREAD);
            if parent_thread == node.thread_id {
                continue;
            }
            let Some(parent_members) = threads.get(parent_thread) else {
                continue;
            };
            let parent_y = parent_members
                .first()
                .map(|member| member.y)
                .unwrap_or_default();

            let merge = set.merge_points.len();
            set.merge_points.push(MergePoint {
                parent_thread_id: parent_thread.to_string(),
                source_thread_id: node.thread_id.clone(),
                source_node_id: node.id,
                x: node.x + NODE_GAP_X / 2,
                y: parent_y + 20,
            });
            set.edges.push(Connection {
                kind: ConnectionKind::DataOut,
                from: Endpoint::Node(node.id),
                to: Endpoint::Merge(merge),
            });
        }
    }

    set
}
