//! Durability and expiry tests for the memory store.

use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;

use swarm_coordination::memory::{CoordinationEvent, EventQuery, MemoryStore};

#[test]
fn entries_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("memory.db");

    {
        let store = MemoryStore::open(&path).unwrap();
        store
            .store("decision", json!({"chosen": "plan_b"}), "decisions", None)
            .unwrap();
        store
            .log_event(&CoordinationEvent::new("agent_added", json!({})).with_agent("a1"))
            .unwrap();
    }

    let store = MemoryStore::open(&path).unwrap();
    assert_eq!(
        store.retrieve("decision", Some("decisions")).unwrap(),
        Some(json!({"chosen": "plan_b"}))
    );
    let events = store.events(&EventQuery::new()).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].agent_id.as_deref(), Some("a1"));
}

#[test]
fn overwrite_keeps_single_row_with_latest_value() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::open(dir.path().join("memory.db")).unwrap();

    store.store("k", json!("first"), "general", None).unwrap();
    store.store("k", json!("second"), "general", None).unwrap();

    assert_eq!(
        store.retrieve("k", Some("general")).unwrap(),
        Some(json!("second"))
    );
    assert_eq!(store.list(Some("general"), None).unwrap().len(), 1);
}

#[tokio::test]
async fn ttl_entry_becomes_invisible_then_swept() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::open(dir.path().join("memory.db")).unwrap();

    store
        .store("ephemeral", json!(1), "general", Some(Duration::from_millis(100)))
        .unwrap();
    assert!(store.retrieve("ephemeral", Some("general")).unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(250)).await;

    // Invisible to reads even before the sweep runs.
    assert!(store.retrieve("ephemeral", Some("general")).unwrap().is_none());
    assert!(store.list(Some("general"), None).unwrap().is_empty());

    assert_eq!(store.sweep_expired().unwrap(), 1);
    assert_eq!(store.sweep_expired().unwrap(), 0);
}

#[tokio::test]
async fn background_sweeper_purges_expired_rows() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::open(dir.path().join("memory.db"))
        .unwrap()
        .shared();

    store
        .store("ephemeral", json!(1), "general", Some(Duration::from_millis(50)))
        .unwrap();
    store.store("durable", json!(2), "general", None).unwrap();

    let handle = store.start_sweeper(Duration::from_millis(100));
    tokio::time::sleep(Duration::from_millis(350)).await;
    handle.abort();

    // The sweeper already removed the expired row.
    assert_eq!(store.sweep_expired().unwrap(), 0);
    assert!(store.retrieve("durable", Some("general")).unwrap().is_some());
    assert_eq!(store.cache_len(), 1);
}

#[test]
fn event_queries_filter_and_order() {
    let dir = tempdir().unwrap();
    let store = MemoryStore::open(dir.path().join("memory.db")).unwrap();

    for step in 0..3 {
        store
            .log_event(
                &CoordinationEvent::new("task_completed", json!({"step": step}))
                    .with_agent("a1")
                    .with_workflow("wf1"),
            )
            .unwrap();
        std::thread::sleep(Duration::from_millis(2));
    }
    store
        .log_event(&CoordinationEvent::new("workflow_completed", json!({})).with_workflow("wf1"))
        .unwrap();

    let all = store.events(&EventQuery::new()).unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].event_type, "workflow_completed");

    let workflow_tasks = store
        .events(
            &EventQuery::new()
                .event_type("task_completed")
                .workflow("wf1")
                .limit(2),
        )
        .unwrap();
    assert_eq!(workflow_tasks.len(), 2);
    assert_eq!(workflow_tasks[0].payload, json!({"step": 2}));
}
