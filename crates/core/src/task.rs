// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task declarations as observed from a target backlog.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a backlog task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Selection priority; ties broken by backlog order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Attempt metadata the worker writes back into the backlog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptNote {
    pub attempt_id: String,
    pub branch: String,
    pub completed_at: String,
}

/// One task record from `.leviathan/backlog.yaml`.
///
/// Declared by humans in the target repository; the control plane only
/// observes it. `ready` must be true and `status` pending for the task to
/// be executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub id: String,
    pub title: String,
    /// Informational scope tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub ready: bool,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub allowed_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptNote>,
}

impl TaskSpec {
    /// True when the record itself allows execution (scope and
    /// dependencies are checked against the policy and backlog elsewhere).
    pub fn is_executable(&self) -> bool {
        self.ready && self.status == TaskStatus::Pending
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
