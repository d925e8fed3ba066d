// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt terminals and failure kinds.

use serde::{Deserialize, Serialize};

/// Branch namespace for agent-authored branches. The open-PR fingerprint
/// is "branch name starts with `agent/`".
pub const AGENT_BRANCH_PREFIX: &str = "agent";

/// Branch name for an attempt: `agent/<taskId>-<attemptId>`.
pub fn attempt_branch(task_id: &str, attempt_id: &str) -> String {
    format!("{AGENT_BRANCH_PREFIX}/{task_id}-{attempt_id}")
}

/// Terminal status of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptStatus {
    Succeeded,
    Failed,
    TimedOut,
    Cancelled,
}

impl AttemptStatus {
    /// Whether this terminal counts toward the circuit breaker.
    /// Cancellations are operator actions, not failures.
    pub fn counts_as_failure(&self) -> bool {
        matches!(self, AttemptStatus::Failed | AttemptStatus::TimedOut)
    }
}

/// Machine-readable classification of a failed attempt, keyed to the
/// worker step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Clone,
    Auth,
    ScopeViolation,
    Execute,
    Push,
    PrOpen,
    BacklogWriteback,
    Timeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Clone => "clone",
            FailureKind::Auth => "auth",
            FailureKind::ScopeViolation => "scopeViolation",
            FailureKind::Execute => "execute",
            FailureKind::Push => "push",
            FailureKind::PrOpen => "prOpen",
            FailureKind::BacklogWriteback => "backlogWriteback",
            FailureKind::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;
