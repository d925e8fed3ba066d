// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry-cap, running-attempt, and circuit-window counting.

use super::*;
use lv_core::EventKind;

#[test]
fn retry_cap_counts_running_and_terminal_but_not_invalidated() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "k3", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&created(&mut feed, "demo", "k3", "att-2", 2));

    // One failed + one running.
    assert_eq!(graph.attempts_for_task("demo", "k3"), 2);
    assert_eq!(graph.running_attempts("demo"), 1);

    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptInvalidated {
            attempt_id: lv_core::AttemptId::from_string("att-1"),
            reason: "operator reset".to_string(),
        },
    ));
    assert_eq!(graph.attempts_for_task("demo", "k3"), 1);
}

#[test]
fn attempt_numbers_never_reuse_even_after_invalidation() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "k", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptInvalidated {
            attempt_id: lv_core::AttemptId::from_string("att-1"),
            reason: "reset".to_string(),
        },
    ));

    assert_eq!(graph.next_attempt_number("demo", "k"), 2);
    assert_eq!(graph.next_attempt_number("demo", "fresh"), 1);
}

#[test]
fn consecutive_failures_reset_on_success() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "a", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&created(&mut feed, "demo", "b", "att-2", 1));
    graph.apply(&failed(&mut feed, "demo", "att-2"));
    assert_eq!(graph.consecutive_failures("demo"), 2);

    graph.apply(&created(&mut feed, "demo", "c", "att-3", 1));
    graph.apply(&succeeded(&mut feed, "demo", "att-3"));
    assert_eq!(graph.consecutive_failures("demo"), 0);

    graph.apply(&created(&mut feed, "demo", "d", "att-4", 1));
    graph.apply(&failed(&mut feed, "demo", "att-4"));
    assert_eq!(graph.consecutive_failures("demo"), 1);
}

#[test]
fn cancelled_attempts_do_not_break_or_extend_the_failure_window() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "a", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&created(&mut feed, "demo", "b", "att-2", 1));
    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptCancelled {
            attempt_id: lv_core::AttemptId::from_string("att-2"),
            error_summary: None,
        },
    ));
    graph.apply(&created(&mut feed, "demo", "c", "att-3", 1));
    graph.apply(&failed(&mut feed, "demo", "att-3"));

    // fail, cancel, fail → two consecutive failures.
    assert_eq!(graph.consecutive_failures("demo"), 2);
}

#[test]
fn invalidation_clears_attempts_from_the_circuit_window() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "a", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&created(&mut feed, "demo", "b", "att-2", 1));
    graph.apply(&failed(&mut feed, "demo", "att-2"));
    assert_eq!(graph.consecutive_failures("demo"), 2);

    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptInvalidated {
            attempt_id: lv_core::AttemptId::from_string("att-2"),
            reason: "infra outage, not the task's fault".to_string(),
        },
    ));
    assert_eq!(graph.consecutive_failures("demo"), 1);
}

#[test]
fn failure_windows_are_per_target() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "a", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&created(&mut feed, "other", "a", "att-2", 1));
    graph.apply(&succeeded(&mut feed, "other", "att-2"));

    assert_eq!(graph.consecutive_failures("demo"), 1);
    assert_eq!(graph.consecutive_failures("other"), 0);
    assert_eq!(graph.consecutive_failures("unknown"), 0);
}

#[test]
fn fetch_error_skips_count_toward_the_circuit() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    // Register the target so the skip counter has a home.
    graph.apply(&feed.entry(
        "demo",
        EventKind::TargetRegistered {
            target: "demo".to_string(),
            repo_url: "https://example.test/acme/demo.git".to_string(),
            default_branch: "main".to_string(),
            policy: lv_core::Policy::default(),
        },
    ));

    for _ in 0..2 {
        graph.apply(&feed.entry(
            "demo",
            EventKind::SchedulerSkipped {
                reason: lv_core::SkipReason::FetchError,
                task_id: None,
                detail: Some("remote unreachable".to_string()),
            },
        ));
    }
    assert_eq!(graph.consecutive_failures("demo"), 2);
    assert_eq!(graph.targets["demo"].skips, 2);

    // Non-fetch skips do not contribute.
    graph.apply(&feed.entry(
        "demo",
        EventKind::SchedulerSkipped {
            reason: lv_core::SkipReason::PrCap,
            task_id: None,
            detail: None,
        },
    ));
    assert_eq!(graph.consecutive_failures("demo"), 2);

    // Operator invalidation clears fetch sentinels.
    graph.apply(&created(&mut feed, "demo", "k", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    assert_eq!(graph.consecutive_failures("demo"), 3);
    graph.apply(&feed.entry(
        "demo",
        EventKind::AttemptInvalidated {
            attempt_id: lv_core::AttemptId::from_string("att-1"),
            reason: "operator reset".to_string(),
        },
    ));
    assert_eq!(graph.consecutive_failures("demo"), 0);
}

#[test]
fn recent_failures_sorted_newest_first() {
    let mut feed = Feed::new();
    let mut graph = Graph::default();

    graph.apply(&created(&mut feed, "demo", "a", "att-1", 1));
    graph.apply(&failed(&mut feed, "demo", "att-1"));
    graph.apply(&created(&mut feed, "demo", "b", "att-2", 1));
    graph.apply(&failed(&mut feed, "demo", "att-2"));
    graph.apply(&created(&mut feed, "demo", "c", "att-3", 1));
    graph.apply(&succeeded(&mut feed, "demo", "att-3"));

    let failures = graph.recent_failures(Some("demo"), 10);
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].id, "att-2");
    assert_eq!(failures[1].id, "att-1");

    let limited = graph.recent_failures(Some("demo"), 1);
    assert_eq!(limited.len(), 1);
}
