// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders and fixtures shared by other crates' tests.

use crate::clock::FakeClock;
use crate::event::{Event, EventKind};
use crate::id::AttemptId;
use crate::policy::Policy;
use crate::task::{TaskPriority, TaskSpec, TaskStatus};

/// A permissive one-directory policy, the usual fixture baseline.
pub fn docs_policy() -> Policy {
    Policy {
        allowed_path_prefixes: vec!["docs/".to_string()],
        max_open_prs: 1,
        max_running_attempts: 1,
        max_attempts_per_task: 2,
        circuit_breaker_failures: 2,
        ..Policy::default()
    }
}

/// Builder for backlog task fixtures.
pub struct TaskBuilder {
    task: TaskSpec,
}

impl TaskBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            task: TaskSpec {
                id: id.to_string(),
                title: format!("task {id}"),
                scope: None,
                ready: true,
                status: TaskStatus::Pending,
                priority: TaskPriority::Normal,
                allowed_paths: vec!["docs/README.md".to_string()],
                dependencies: vec![],
                acceptance_criteria: vec![],
                attempts: vec![],
            },
        }
    }

    pub fn ready(mut self, ready: bool) -> Self {
        self.task.ready = ready;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn allowed_paths(mut self, paths: &[&str]) -> Self {
        self.task.allowed_paths = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn dependencies(mut self, deps: &[&str]) -> Self {
        self.task.dependencies = deps.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn build(self) -> TaskSpec {
        self.task
    }
}

/// Stamp an event from a fake clock with a deterministic actor.
pub fn event_at(clock: &FakeClock, kind: EventKind) -> Event {
    Event::now(clock, "test", kind)
}

/// The full attempt lifecycle as events, for projection fixtures.
pub fn attempt_lifecycle(
    clock: &FakeClock,
    task_id: &str,
    attempt_id: &AttemptId,
    attempt_number: u32,
) -> Vec<Event> {
    vec![
        event_at(
            clock,
            EventKind::AttemptCreated {
                attempt_id: *attempt_id,
                task_id: task_id.to_string(),
                attempt_number,
            },
        ),
        event_at(clock, EventKind::AttemptStarted { attempt_id: *attempt_id }),
    ]
}
