// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lv_core::{AttemptStatus, EventKind, FailureKind};

#[test]
fn attempt_lifecycle_builds_node_and_edges() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "fix-readme", "att-1", 1));
    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptStarted { attempt_id: lv_core::AttemptId::from_string("att-1") },
    ));
    graph.apply(&succeeded(&mut feed, "demo", "att-1"));

    let node = &graph.attempts["att-1"];
    assert_eq!(node.task_id, "fix-readme");
    assert_eq!(node.attempt_number, 1);
    assert!(node.started_at.is_some());
    assert_eq!(node.status, Some(AttemptStatus::Succeeded));
    assert_eq!(node.events.len(), 3);

    // Task stub and edges exist even without task.created.
    assert!(graph.tasks.contains_key("demo/fix-readme"));
    assert!(graph
        .edges
        .iter()
        .any(|e| e.kind == EdgeKind::HasAttempt && e.from == "demo/fix-readme" && e.to == "att-1"));
}

#[test]
fn terminal_transitions_are_only_if_unset() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    // A later (bogus) success must not overwrite the terminal.
    graph.apply(&succeeded(&mut feed, "demo", "att-1"));

    assert_eq!(graph.attempts["att-1"].status, Some(AttemptStatus::Failed));
}

#[test]
fn timeout_failures_surface_as_timed_out() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-1", 1));
    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptFailed {
            attempt_id: lv_core::AttemptId::from_string("att-1"),
            failure_kind: FailureKind::Timeout,
            error_summary: "attempt exceeded 1800s".to_string(),
            artifact: None,
        },
    ));

    let node = &graph.attempts["att-1"];
    assert_eq!(node.status, Some(AttemptStatus::TimedOut));
    assert_eq!(node.failure_kind, Some(FailureKind::Timeout));
}

#[test]
fn invalidation_is_sticky_and_no_op_on_repeat() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptInvalidated {
            attempt_id: lv_core::AttemptId::from_string("att-1"),
            reason: "flaky infra".to_string(),
        },
    ));
    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptInvalidated {
            attempt_id: lv_core::AttemptId::from_string("att-1"),
            reason: "second reason ignored".to_string(),
        },
    ));

    let node = &graph.attempts["att-1"];
    assert!(node.invalidated);
    assert_eq!(node.invalidation_reason.as_deref(), Some("flaky infra"));
}

#[test]
fn pr_created_links_attempt_and_opens_pr() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-1", 1));
    graph.apply(&pr_created(&mut feed, "demo", "att-1", 7));

    assert_eq!(graph.attempts["att-1"].pr_number, Some(7));
    let prs = graph.open_prs_for_target("demo");
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].number, 7);

    // Merge closes it.
    graph.apply(&feed.entry("demo", EventKind::PrMerged { number: 7 }));
    assert!(graph.open_prs_for_target("demo").is_empty());
    assert_eq!(graph.prs["demo#7"].state, PrState::Merged);
}

#[test]
fn non_agent_branches_do_not_count_as_open_agent_prs() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-1", 1));
    let mut entry = pr_created(&mut feed, "demo", "att-1", 9);
    if let EventKind::PrCreated { pr, .. } = &mut entry.event.kind {
        pr.branch_name = "agents/nope".to_string();
    }
    graph.apply(&entry);

    assert!(graph.open_prs_for_target("demo").is_empty());
}

#[test]
fn attempt_lookup_by_unique_prefix() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-abcdef", 1));
    graph.apply(&created(&mut feed, "demo", "t2", "att-xyz", 1));

    assert!(graph.attempt("att-abc").is_some());
    assert!(graph.attempt("att-a").is_some());
    // Ambiguous prefix resolves to none.
    assert!(graph.attempt("att-").is_none());
    assert!(graph.attempt("nope").is_none());
}

#[test]
fn artifacts_attach_to_attempts() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-1", 1));
    graph.apply(&feed.entry(
        "demo",
        EventKind::ArtifactCreated {
            artifact: lv_core::ArtifactRef {
                sha256: "ab".repeat(32),
                kind: "worker-log".to_string(),
                uri: "artifacts/ab/abab".to_string(),
                size: 128,
                mime_type: Some("text/plain".to_string()),
            },
            attempt_id: Some(lv_core::AttemptId::from_string("att-1")),
        },
    ));

    let detail = graph.attempt("att-1").unwrap();
    assert_eq!(detail.artifacts.len(), 1);
    assert_eq!(detail.artifacts[0].kind, "worker-log");
}

#[test]
fn summary_counts_nodes_and_recent() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "t", "att-1", 1));
    graph.apply(&succeeded(&mut feed, "demo", "att-1"));

    let summary = graph.summary();
    assert_eq!(summary.attempts, 1);
    assert_eq!(summary.tasks, 1);
    assert_eq!(summary.running_attempts, 0);
    assert_eq!(summary.last_applied_seq, 2);
    // Newest first.
    assert_eq!(summary.recent[0].event_type, "attempt.succeeded");
}
