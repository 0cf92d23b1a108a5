#![forbid(unsafe_code)]

use std::path::PathBuf;

use pw_core::plan::{NodeDraft, Plan};
use pw_storage::{StoreError, load_plan, load_templates, save_plan};

fn temp_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("pw_storage_{}_{}", std::process::id(), name));
    path
}

fn sample_plan() -> Plan {
    let mut plan = Plan::new();
    plan.add_node(NodeDraft {
        node_name: "gather".to_string(),
        node_type: "llm-first".to_string(),
        task_prompt: "Collect the daily stats".to_string(),
        ..NodeDraft::default()
    })
    .unwrap();
    let branch = plan.create_branch(2).unwrap();
    let thread = plan.node(branch).unwrap().thread_id.clone();
    plan.add_node(NodeDraft {
        node_name: "summarize".to_string(),
        node_type: "llm-first".to_string(),
        data_in_thread: Some(thread),
        data_in_slice: Some((-1, None)),
        ..NodeDraft::default()
    })
    .unwrap();
    plan
}

#[test]
fn save_then_load_is_structurally_identical() {
    let path = temp_path("round_trip.json");
    let plan = sample_plan();

    save_plan(&path, &plan).unwrap();
    let loaded = load_plan(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded, plan);
}

#[test]
fn templates_load_by_name() {
    let path = temp_path("templates.json");
    std::fs::write(
        &path,
        r#"{
            "test1": {
                "nodes": [
                    { "node_name": "fetch", "node_type": "llm-first" },
                    { "node_name": "report", "node_type": "llm-first" }
                ]
            },
            "empty": { "nodes": [] }
        }"#,
    )
    .unwrap();

    let templates = load_templates(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(templates.len(), 2);
    assert_eq!(templates["test1"].node_count(), 2);
    // An empty document still loads: the main-start node is synthesized.
    assert_eq!(templates["empty"].node_count(), 1);
    assert_eq!(templates["empty"].nodes()[0].thread_id, "main");
}

#[test]
fn junk_payload_is_unloadable() {
    let path = temp_path("junk.json");
    std::fs::write(&path, r#"{"invalid": "plan"}"#).unwrap();

    let err = load_plan(&path).unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(err, StoreError::UnloadablePlan));
}

#[test]
fn missing_file_surfaces_io() {
    let err = load_plan(temp_path("does_not_exist.json")).unwrap_err();
    assert!(matches!(err, StoreError::Io(_)));
}
