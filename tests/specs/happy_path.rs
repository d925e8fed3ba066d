// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One green tick: selection, dispatch, clone, edit, commit, push, PR,
//! writeback, terminal, all observable from the journal.

use crate::support::Rig;
use lv_core::TaskStatus;
use lv_engine::TickOutcome;

#[tokio::test]
async fn one_tick_delivers_one_pull_request() {
    let rig = Rig::new();
    let scheduler = rig.closed_loop(rig.default_editor());
    let target = rig.target();

    let outcome = scheduler.tick(&target).await.unwrap();
    let (attempt_id, task_id) = match outcome {
        TickOutcome::Dispatched { attempt_id, task_id } => (attempt_id, task_id),
        other => panic!("expected dispatch, got {other:?}"),
    };
    assert_eq!(task_id, "fix-readme");

    rig.wait_for_terminal(attempt_id.as_str()).await;

    // Journal tells the whole story in order.
    assert_eq!(
        rig.journal_event_types(),
        vec![
            "attempt.created",
            "attempt.started",
            "pr.created",
            "task.completed",
            "attempt.succeeded",
        ]
    );

    // The attempt node carries the PR and attempt number 1.
    let graph = rig.state.graph.lock();
    let attempt = &graph.attempts[attempt_id.as_str()];
    assert_eq!(attempt.attempt_number, 1);
    assert!(attempt.pr_number.is_some());

    // The PR is open on the agent branch with a non-empty URL.
    let prs = graph.open_prs_for_target("demo");
    assert_eq!(prs.len(), 1);
    assert!(prs[0].branch_name.starts_with(&format!("agent/fix-readme-{attempt_id}")));
    assert!(!prs[0].url.is_empty());

    // Task is completed by exactly this attempt.
    let task = &graph.tasks["demo/fix-readme"];
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.completed_by.as_deref(), Some(attempt_id.as_str()));
    drop(graph);

    // Writeback happened as a second commit on the same branch.
    let commits = rig.repo.commits();
    assert_eq!(commits.len(), 2);
    assert!(commits[1].contains("record completion"));
    assert_eq!(rig.repo.pushed_branches().len(), 2);
}

#[tokio::test]
async fn chain_is_verifiable_after_the_full_loop() {
    let rig = Rig::new();
    let scheduler = rig.closed_loop(rig.default_editor());
    let outcome = scheduler.tick(&rig.target()).await.unwrap();
    let attempt_id = match outcome {
        TickOutcome::Dispatched { attempt_id, .. } => attempt_id,
        other => panic!("expected dispatch, got {other:?}"),
    };
    rig.wait_for_terminal(attempt_id.as_str()).await;

    let journal = rig.state.journal.lock();
    let verdict = journal.verify_chain(0, None).unwrap();
    assert!(verdict.is_valid(), "got {verdict:?}");
}

#[tokio::test]
async fn second_tick_skips_on_pr_cap_after_delivery() {
    let rig = Rig::new();
    let scheduler = rig.closed_loop(rig.default_editor());
    let target = rig.target();

    let outcome = scheduler.tick(&target).await.unwrap();
    let attempt_id = match outcome {
        TickOutcome::Dispatched { attempt_id, .. } => attempt_id,
        other => panic!("expected dispatch, got {other:?}"),
    };
    rig.wait_for_terminal(attempt_id.as_str()).await;

    // The PR from the first attempt is open on the host, so the PR cap
    // (maxOpenPRs = 1) trips before anything else is considered.
    let outcome = scheduler.tick(&target).await.unwrap();
    assert_eq!(outcome, TickOutcome::Skipped(lv_core::SkipReason::PrCap));
}
