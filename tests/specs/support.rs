// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scenario rig: real journal + projection + ingestion path,
//! scripted adapters everywhere the outside world would be.

use std::sync::Arc;
use std::time::Duration;

use lv_adapters::{BackoffConfig, FakeEditor, FakeHost, FakeRepo, TaskEditor};
use lv_core::test_support::docs_policy;
use lv_core::{Bundle, Event, EventKind, FakeClock, Policy};
use lv_engine::{
    AttemptContext, AutonomySwitch, LocalLauncher, Scheduler, SchedulerConfig, Worker,
    WorkerLauncher,
};
use lv_server::{AppState, LocalControlPlane};
use lv_storage::{Graph, Journal, RangeFilter, TargetNode};
use tempfile::TempDir;

pub const DEMO_BACKLOG: &str = r#"
tasks:
  - id: fix-readme
    title: Fix the readme
    ready: true
    status: pending
    allowedPaths:
      - docs/README.md
"#;

pub struct Rig {
    pub state: AppState,
    pub control: Arc<LocalControlPlane>,
    pub repo: FakeRepo,
    pub host: FakeHost,
    pub clock: FakeClock,
    pub dir: TempDir,
    pub autonomy_path: std::path::PathBuf,
}

impl Rig {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let journal = Journal::open(dir.path().join("journal")).unwrap();
        let autonomy_path = dir.path().join("autonomy.yaml");
        std::fs::write(&autonomy_path, "autonomyEnabled: true\n").unwrap();

        let state = AppState::new(journal, Graph::default())
            .with_autonomy(AutonomySwitch::new(Some(autonomy_path.clone())));
        let control = Arc::new(LocalControlPlane::new(state.clone()));

        let repo = FakeRepo::new();
        repo.put_file(".leviathan/backlog.yaml", DEMO_BACKLOG);
        repo.set_changed_paths(&["docs/README.md"]);

        Self {
            state,
            control,
            repo,
            host: FakeHost::new(),
            clock: FakeClock::new(),
            dir,
            autonomy_path,
        }
    }

    pub fn target(&self) -> TargetNode {
        TargetNode {
            id: "demo".to_string(),
            repo_url: "https://example.test/acme/demo.git".to_string(),
            default_branch: "main".to_string(),
            policy: docs_policy(),
            registered_at: lv_core::Clock::now_utc(&self.clock),
            skips: 0,
        }
    }

    /// Register the demo target through the real ingestion path.
    pub fn register_target(&self, policy: &Policy) {
        let event = Event::now(
            &self.clock,
            "admin",
            EventKind::TargetRegistered {
                target: "demo".to_string(),
                repo_url: "https://example.test/acme/demo.git".to_string(),
                default_branch: "main".to_string(),
                policy: policy.clone(),
            },
        );
        lv_server::append_bundle(&self.state, &Bundle::new("demo", vec![event])).unwrap();
    }

    pub fn worker(&self, editor: Arc<dyn TaskEditor>) -> Arc<Worker<FakeClock>> {
        Arc::new(
            Worker::new(
                Arc::new(self.repo.clone()),
                Arc::new(self.host.clone()),
                Arc::clone(&self.control) as _,
                editor,
                self.clock.clone(),
                self.dir.path().join("scratch"),
            )
            .with_pr_backoff(BackoffConfig::fast())
            .with_submit_backoff(BackoffConfig::fast()),
        )
    }

    pub fn scheduler(&self, launcher: Arc<dyn WorkerLauncher>) -> Scheduler<FakeClock> {
        Scheduler::new(
            Arc::clone(&self.state.graph),
            Arc::new(self.repo.clone()),
            Arc::new(self.host.clone()),
            Arc::clone(&self.control) as _,
            launcher,
            AutonomySwitch::new(Some(self.autonomy_path.clone())),
            self.clock.clone(),
            SchedulerConfig { token_env: None, ..SchedulerConfig::default() },
        )
    }

    /// Scheduler wired to a real in-process worker.
    pub fn closed_loop(&self, editor: Arc<dyn TaskEditor>) -> Scheduler<FakeClock> {
        let launcher = Arc::new(LocalLauncher::new(self.worker(editor)));
        self.scheduler(launcher)
    }

    pub fn default_editor(&self) -> Arc<dyn TaskEditor> {
        Arc::new(FakeEditor::writing(&["docs/README.md"]))
    }

    /// Event type names in journal order.
    pub fn journal_event_types(&self) -> Vec<String> {
        self.state
            .journal
            .lock()
            .range(0, None, &RangeFilter::default())
            .unwrap()
            .iter()
            .map(|entry| entry.event.kind.type_name().to_string())
            .collect()
    }

    /// Submit a synthetic failed attempt through the real ingestion path.
    pub fn record_failure(&self, task: &str, attempt: &str, n: u32) {
        let attempt_id = lv_core::AttemptId::from_string(attempt);
        let events = vec![
            Event::now(
                &self.clock,
                "scheduler",
                EventKind::AttemptCreated {
                    attempt_id,
                    task_id: task.to_string(),
                    attempt_number: n,
                },
            ),
            Event::now(
                &self.clock,
                format!("worker:{attempt}"),
                EventKind::AttemptFailed {
                    attempt_id,
                    failure_kind: lv_core::FailureKind::Execute,
                    error_summary: "scripted failure".to_string(),
                    artifact: None,
                },
            ),
        ];
        lv_server::append_bundle(&self.state, &Bundle::new("demo", events)).unwrap();
    }

    /// Wait until the projection shows a terminal for the attempt.
    pub async fn wait_for_terminal(&self, attempt_id: &str) {
        for _ in 0..200 {
            {
                let graph = self.state.graph.lock();
                if graph
                    .attempts
                    .get(attempt_id)
                    .is_some_and(|node| node.status.is_some())
                {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("attempt {attempt_id} never reached a terminal");
    }
}

/// Hand-built context, for worker-level scenarios.
pub fn hand_context(task: lv_core::TaskSpec) -> AttemptContext {
    AttemptContext {
        target: "demo".to_string(),
        repo_url: "https://example.test/acme/demo.git".to_string(),
        base_branch: "main".to_string(),
        task,
        attempt_id: lv_core::AttemptId::from_string("att-hand"),
        attempt_number: 1,
        policy: docs_policy(),
        token_env: None,
        token_user: "x-access-token".to_string(),
        emit_created: true,
    }
}
