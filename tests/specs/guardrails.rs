// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PR cap, scope enforcement, retry cap, and the circuit breaker.

use std::sync::Arc;

use crate::support::{hand_context, Rig};
use lv_adapters::FakeEditor;
use lv_core::test_support::TaskBuilder;
use lv_core::{FailureKind, SkipReason};
use lv_engine::{TickOutcome, WorkerOutcome};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn open_agent_pr_at_cap_skips_with_pr_cap_and_mints_nothing() {
    let rig = Rig::new();
    rig.host.with_open_pr("agent/old-task-att-0");
    let scheduler = rig.closed_loop(rig.default_editor());

    let outcome = scheduler.tick(&rig.target()).await.unwrap();
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::PrCap));

    // Exactly one scheduler.skipped, zero attempt.created.
    assert_eq!(rig.journal_event_types(), vec!["scheduler.skipped"]);
}

#[tokio::test]
async fn out_of_scope_task_is_never_selected() {
    let rig = Rig::new();
    rig.repo.put_file(
        ".leviathan/backlog.yaml",
        "tasks:\n  - {id: k2, title: sneaky, ready: true, allowedPaths: [docs2/notes.md]}\n",
    );
    let scheduler = rig.closed_loop(rig.default_editor());

    let outcome = scheduler.tick(&rig.target()).await.unwrap();
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::NoCandidate));
}

#[tokio::test]
async fn hand_submitted_out_of_scope_task_fails_before_any_push() {
    let rig = Rig::new();
    // The editor walks outside the task's allowed paths; the working
    // tree reports the extra modification.
    rig.repo.set_changed_paths(&["docs2/notes.md"]);
    let worker = rig.worker(Arc::new(FakeEditor::writing(&["docs2/notes.md"])));

    let task = TaskBuilder::new("k2").allowed_paths(&["docs/"]).build();
    let outcome = worker.run(hand_context(task), CancellationToken::new()).await;

    assert!(matches!(
        outcome,
        WorkerOutcome::Failed { kind: FailureKind::ScopeViolation, .. }
    ));
    assert!(rig.repo.pushed_branches().is_empty());

    // The failure is on the journal with its kind.
    let types = rig.journal_event_types();
    assert_eq!(types.last().map(String::as_str), Some("attempt.failed"));
    let graph = rig.state.graph.lock();
    assert_eq!(graph.attempts["att-hand"].failure_kind, Some(FailureKind::ScopeViolation));
}

#[tokio::test]
async fn retry_cap_trips_on_the_third_tick() {
    let rig = Rig::new();
    // docs_policy: maxAttemptsPerTask = 2.
    rig.record_failure("fix-readme", "att-1", 1);
    // Unrelated success keeps the circuit (threshold 2) closed.
    rig.record_failure("fix-readme", "att-2", 2);
    {
        use lv_core::{Bundle, Event, EventKind};
        let events = vec![
            Event::now(
                &rig.clock,
                "scheduler",
                EventKind::AttemptCreated {
                    attempt_id: lv_core::AttemptId::from_string("att-ok"),
                    task_id: "other".to_string(),
                    attempt_number: 1,
                },
            ),
            Event::now(
                &rig.clock,
                "worker:att-ok",
                EventKind::AttemptSucceeded {
                    attempt_id: lv_core::AttemptId::from_string("att-ok"),
                },
            ),
        ];
        lv_server::append_bundle(&rig.state, &Bundle::new("demo", events)).unwrap();
    }

    let scheduler = rig.closed_loop(rig.default_editor());
    let outcome = scheduler.tick(&rig.target()).await.unwrap();
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::RetryCap));
}

#[tokio::test]
async fn circuit_opens_after_consecutive_failures_and_invalidation_recloses_it() {
    let rig = Rig::new();
    // docs_policy: circuitBreakerFailures = 2; failures across tasks.
    rig.record_failure("alpha", "att-1", 1);
    rig.record_failure("beta", "att-2", 1);

    let scheduler = rig.closed_loop(rig.default_editor());
    let outcome = scheduler.tick(&rig.target()).await.unwrap();
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::CircuitOpen));

    // Operator invalidates one blocking attempt; the circuit re-closes.
    {
        use lv_core::{Bundle, Event, EventKind};
        let event = Event::now(
            &rig.clock,
            "operator",
            EventKind::AttemptInvalidated {
                attempt_id: lv_core::AttemptId::from_string("att-2"),
                reason: "infra outage".to_string(),
            },
        );
        lv_server::append_bundle(&rig.state, &Bundle::new("demo", vec![event])).unwrap();
    }

    let outcome = scheduler.tick(&rig.target()).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Dispatched { .. }), "got {outcome:?}");
}

#[tokio::test]
async fn cancelled_attempts_do_not_open_the_circuit() {
    let rig = Rig::new();
    rig.record_failure("alpha", "att-1", 1);
    {
        use lv_core::{Bundle, Event, EventKind};
        let events = vec![
            Event::now(
                &rig.clock,
                "scheduler",
                EventKind::AttemptCreated {
                    attempt_id: lv_core::AttemptId::from_string("att-c"),
                    task_id: "beta".to_string(),
                    attempt_number: 1,
                },
            ),
            Event::now(
                &rig.clock,
                "worker:att-c",
                EventKind::AttemptCancelled {
                    attempt_id: lv_core::AttemptId::from_string("att-c"),
                    error_summary: None,
                },
            ),
        ];
        lv_server::append_bundle(&rig.state, &Bundle::new("demo", events)).unwrap();
    }

    // One failure + one cancellation: circuit (threshold 2) stays closed.
    let scheduler = rig.closed_loop(rig.default_editor());
    let outcome = scheduler.tick(&rig.target()).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Dispatched { .. }), "got {outcome:?}");
}
