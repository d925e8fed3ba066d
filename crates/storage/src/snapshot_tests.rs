// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::journal::JournalEntry;
use lv_core::{AttemptId, Event, EventKind, FakeClock};
use tempfile::tempdir;

fn sample_graph() -> Graph {
    let clock = FakeClock::new();
    let mut graph = Graph::default();
    graph.apply(&JournalEntry {
        seq: 1,
        target: "demo".to_string(),
        prev_hash: String::new(),
        hash: String::new(),
        event: Event::now(
            &clock,
            "scheduler",
            EventKind::AttemptCreated {
                attempt_id: AttemptId::from_string("att-1"),
                task_id: "fix-readme".to_string(),
                attempt_number: 1,
            },
        ),
    });
    graph
}

#[test]
fn round_trips_graph_and_cursor() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.snap");
    let graph = sample_graph();

    write_snapshot(&path, &graph).unwrap();
    let loaded = load_snapshot(&path).unwrap();

    assert_eq!(loaded.last_applied_seq, 1);
    assert_eq!(loaded.attempts.len(), 1);
    assert_eq!(loaded.attempts["att-1"].task_id, "fix-readme");
}

#[test]
fn missing_snapshot_means_rebuild() {
    let dir = tempdir().unwrap();
    assert!(load_snapshot(&dir.path().join("absent.snap")).is_none());
}

#[test]
fn corrupt_snapshot_is_discarded_not_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.snap");
    std::fs::write(&path, b"definitely not zstd").unwrap();
    assert!(load_snapshot(&path).is_none());
}

#[test]
fn snapshot_write_is_atomic_rename() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("graph.snap");
    write_snapshot(&path, &sample_graph()).unwrap();
    // No temp file left behind.
    assert!(!path.with_extension("snap.tmp").exists());
    assert!(path.exists());
}
