// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kill switch: the graceful layer trips at the next tick while
//! in-flight workers run to completion and their terminals are accepted.

use std::sync::Arc;

use crate::support::Rig;
use async_trait::async_trait;
use lv_adapters::{EditorError, TaskEditor};
use lv_core::{SkipReason, TaskSpec};
use lv_engine::TickOutcome;

/// Editor that parks until released, so a worker can be caught mid-flight.
struct GatedEditor {
    release: tokio::sync::Notify,
    entered: tokio::sync::Notify,
}

impl GatedEditor {
    fn new() -> Arc<Self> {
        Arc::new(Self { release: tokio::sync::Notify::new(), entered: tokio::sync::Notify::new() })
    }
}

#[async_trait]
impl TaskEditor for GatedEditor {
    async fn edit(&self, workdir: &std::path::Path, task: &TaskSpec) -> Result<Vec<String>, EditorError> {
        self.entered.notify_one();
        self.release.notified().await;
        let path = workdir.join("docs/README.md");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, format!("edited for {}\n", task.id))?;
        Ok(vec!["docs/README.md".to_string()])
    }
}

#[tokio::test]
async fn very_next_tick_skips_and_running_worker_completes() {
    let rig = Rig::new();
    let editor = GatedEditor::new();
    let scheduler = rig.closed_loop(Arc::clone(&editor) as Arc<dyn TaskEditor>);
    let target = rig.target();

    // Dispatch a worker and catch it mid-attempt.
    let outcome = scheduler.tick(&target).await.unwrap();
    let attempt_id = match outcome {
        TickOutcome::Dispatched { attempt_id, .. } => attempt_id,
        other => panic!("expected dispatch, got {other:?}"),
    };
    editor.entered.notified().await;

    // Operator flips the switch; the very next tick trips the gate.
    std::fs::write(&rig.autonomy_path, "autonomyEnabled: false\n").unwrap();
    let outcome = scheduler.tick(&target).await.unwrap();
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::AutonomyDisabled));

    // The in-flight worker keeps running and its terminal is accepted.
    editor.release.notify_one();
    rig.wait_for_terminal(attempt_id.as_str()).await;
    let graph = rig.state.graph.lock();
    assert_eq!(
        graph.attempts[attempt_id.as_str()].status,
        Some(lv_core::AttemptStatus::Succeeded)
    );
}

#[tokio::test]
async fn switch_back_on_resumes_scheduling() {
    let rig = Rig::new();
    std::fs::write(&rig.autonomy_path, "autonomyEnabled: false\n").unwrap();
    let scheduler = rig.closed_loop(rig.default_editor());
    let target = rig.target();

    let outcome = scheduler.tick(&target).await.unwrap();
    assert_eq!(outcome, TickOutcome::Skipped(SkipReason::AutonomyDisabled));

    std::fs::write(&rig.autonomy_path, "autonomyEnabled: true\n").unwrap();
    let outcome = scheduler.tick(&target).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Dispatched { .. }), "got {outcome:?}");
}
