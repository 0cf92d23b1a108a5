#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pw_core::plan::{Plan, PlanNode};

fn default_thread() -> String {
    "main".to_string()
}

/// One node as it sits in a plan file. Identity and layout fields are
/// optional so hand-written or stale files still load; the reconciliation
/// pass recomputes them anyway.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub id: i64,
    pub node_name: String,
    pub node_type: String,
    #[serde(default)]
    pub task_prompt: String,
    #[serde(default = "default_thread")]
    pub thread_id: String,
    #[serde(default)]
    pub thread_view_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_in_thread: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_in_slice: Option<(i64, Option<i64>)>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub data_out: bool,
    #[serde(default)]
    pub x: i64,
    #[serde(default)]
    pub y: i64,
}

/// The serialized shape of a whole plan: ordered node records plus the
/// thread id → view index map.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlanDocument {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub thread_view_indices: BTreeMap<String, i64>,
}

/// Turns a parsed document into a reconciled plan. Inconsistent ids and
/// indices are repaired, never rejected.
pub fn decode_plan(document: PlanDocument) -> Plan {
    let nodes = document
        .nodes
        .into_iter()
        .map(|record| PlanNode {
            id: record.id,
            node_name: record.node_name,
            node_type: record.node_type,
            task_prompt: record.task_prompt,
            thread_id: record.thread_id,
            thread_view_index: record.thread_view_index,
            parent_id: record.parent_id,
            parent_thread_id: record.parent_thread_id,
            data_in_thread: record.data_in_thread,
            data_in_slice: record.data_in_slice,
            data_out: record.data_out,
            x: record.x,
            y: record.y,
        })
        .collect();
    Plan::load(nodes, &document.thread_view_indices)
}

/// Serialized form of a plan. The plan's invariants hold by construction,
/// so the emitted ids, indices and coordinates are always consistent.
pub fn encode_plan(plan: &Plan) -> PlanDocument {
    PlanDocument {
        nodes: plan
            .nodes()
            .iter()
            .map(|node| NodeRecord {
                id: node.id,
                node_name: node.node_name.clone(),
                node_type: node.node_type.clone(),
                task_prompt: node.task_prompt.clone(),
                thread_id: node.thread_id.clone(),
                thread_view_index: node.thread_view_index,
                parent_id: node.parent_id,
                parent_thread_id: node.parent_thread_id.clone(),
                data_in_thread: node.data_in_thread.clone(),
                data_in_slice: node.data_in_slice,
                data_out: node.data_out,
                x: node.x,
                y: node.y,
            })
            .collect(),
        thread_view_indices: plan.thread_index_map(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sparse_records_load_with_defaults() {
        let document: PlanDocument = serde_json::from_value(json!({
            "nodes": [
                { "node_name": "start", "node_type": "llm-first" },
                { "node_name": "side", "node_type": "llm-first", "thread_id": "branch_2" }
            ]
        }))
        .unwrap();
        let plan = decode_plan(document);

        assert_eq!(plan.node_count(), 2);
        assert_eq!(plan.nodes()[0].thread_id, "main");
        assert_eq!(plan.nodes()[0].id, 1);
        assert_eq!(plan.nodes()[1].thread_view_index, 1);
    }

    #[test]
    fn data_slice_round_trips_as_a_pair() {
        let document: PlanDocument = serde_json::from_value(json!({
            "nodes": [
                { "node_name": "start", "node_type": "llm-first" },
                {
                    "node_name": "join", "node_type": "llm-first",
                    "data_in_thread": "main", "data_in_slice": [-1, null]
                }
            ]
        }))
        .unwrap();
        let plan = decode_plan(document);
        assert_eq!(plan.nodes()[1].data_in_slice, Some((-1, None)));

        let emitted = serde_json::to_value(encode_plan(&plan)).unwrap();
        assert_eq!(emitted["nodes"][1]["data_in_slice"], json!([-1, null]));
    }

    #[test]
    fn encode_emits_reconciled_identity_and_layout() {
        let document: PlanDocument = serde_json::from_value(json!({
            "nodes": [
                { "id": 9, "node_name": "start", "node_type": "llm-first", "x": 777 },
                { "id": 9, "node_name": "next", "node_type": "llm-first", "y": -5 }
            ]
        }))
        .unwrap();
        let emitted = encode_plan(&decode_plan(document));

        assert_eq!(emitted.nodes[0].id, 1);
        assert_eq!(emitted.nodes[1].id, 2);
        assert_eq!(emitted.nodes[0].x, 0);
        assert_eq!(emitted.nodes[1].x, 220);
        assert_eq!(emitted.thread_view_indices.get("main"), Some(&0));
    }

    #[test]
    fn quiet_flags_are_omitted_from_the_file() {
        let plan = decode_plan(
            serde_json::from_value(json!({
                "nodes": [{ "node_name": "start", "node_type": "llm-first" }]
            }))
            .unwrap(),
        );
        let emitted = serde_json::to_value(encode_plan(&plan)).unwrap();
        let node = &emitted["nodes"][0];
        assert!(node.get("data_out").is_none());
        assert!(node.get("parent_id").is_none());
        assert!(node.get("data_in_thread").is_none());
    }
}
