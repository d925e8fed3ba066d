// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal events.
//!
//! Events are the sole mutators of state. On the wire each event is a JSON
//! object `{eventId, eventType, timestamp, actorId, payload}`; the
//! `eventType`/`payload` pair is the adjacently-tagged [`EventKind`]
//! flattened into the envelope. Unknown type tags deserialize to `Custom`
//! so old servers can replay journals written by newer ones.

use crate::artifact::ArtifactRef;
use crate::attempt::FailureKind;
use crate::clock::Clock;
use crate::id::{AttemptId, EventId};
use crate::policy::Policy;
use crate::pr::PullRequestRef;
use crate::task::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a scheduler tick ended without dispatching a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    AutonomyDisabled,
    CircuitOpen,
    PrCap,
    RunningCap,
    FetchError,
    NoCandidate,
    RetryCap,
    DispatchError,
}

/// Event envelope: identity, wall-clock timestamp, the acting component,
/// and the typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: EventId,
    /// RFC 3339 UTC.
    pub timestamp: DateTime<Utc>,
    pub actor_id: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    /// Build an event stamped from the given clock with a fresh id.
    pub fn now<C: Clock>(clock: &C, actor_id: impl Into<String>, kind: EventKind) -> Self {
        Self {
            event_id: EventId::new(),
            timestamp: clock.now_utc(),
            actor_id: actor_id.into(),
            kind,
        }
    }
}

/// Closed set of event kinds; serializes as `{"eventType": ..., "payload": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", content = "payload")]
pub enum EventKind {
    // -- target --
    #[serde(rename = "target.registered", rename_all = "camelCase")]
    TargetRegistered {
        target: String,
        repo_url: String,
        default_branch: String,
        policy: Policy,
    },

    #[serde(rename = "target.updated", rename_all = "camelCase")]
    TargetUpdated {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        repo_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_branch: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        policy: Option<Policy>,
    },

    // -- task --
    #[serde(rename = "task.created", rename_all = "camelCase")]
    TaskCreated { task_id: String, title: String },

    #[serde(rename = "task.updated", rename_all = "camelCase")]
    TaskUpdated { task_id: String, status: TaskStatus },

    #[serde(rename = "task.completed", rename_all = "camelCase")]
    TaskCompleted { task_id: String, attempt_id: AttemptId },

    // -- attempt --
    #[serde(rename = "attempt.created", rename_all = "camelCase")]
    AttemptCreated {
        attempt_id: AttemptId,
        task_id: String,
        attempt_number: u32,
    },

    #[serde(rename = "attempt.started", rename_all = "camelCase")]
    AttemptStarted { attempt_id: AttemptId },

    #[serde(rename = "attempt.succeeded", rename_all = "camelCase")]
    AttemptSucceeded { attempt_id: AttemptId },

    #[serde(rename = "attempt.failed", rename_all = "camelCase")]
    AttemptFailed {
        attempt_id: AttemptId,
        failure_kind: FailureKind,
        /// Short human-readable summary; stack traces go to artifacts.
        error_summary: String,
        /// SHA-256 of a diagnostics artifact, when one was captured.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        artifact: Option<String>,
    },

    #[serde(rename = "attempt.cancelled", rename_all = "camelCase")]
    AttemptCancelled {
        attempt_id: AttemptId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_summary: Option<String>,
    },

    /// Operator action removing an attempt from retry-cap and circuit
    /// counting. Appends history; deletes nothing.
    #[serde(rename = "attempt.invalidated", rename_all = "camelCase")]
    AttemptInvalidated { attempt_id: AttemptId, reason: String },

    // -- scheduler --
    #[serde(rename = "scheduler.skipped", rename_all = "camelCase")]
    SchedulerSkipped {
        reason: SkipReason,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    // -- pr --
    #[serde(rename = "pr.created", rename_all = "camelCase")]
    PrCreated {
        attempt_id: AttemptId,
        #[serde(flatten)]
        pr: PullRequestRef,
    },

    #[serde(rename = "pr.merged", rename_all = "camelCase")]
    PrMerged { number: u64 },

    #[serde(rename = "pr.closed", rename_all = "camelCase")]
    PrClosed { number: u64 },

    // -- artifact --
    #[serde(rename = "artifact.created", rename_all = "camelCase")]
    ArtifactCreated {
        #[serde(flatten)]
        artifact: ArtifactRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attempt_id: Option<AttemptId>,
    },

    /// Catch-all for unknown event types (forward compatibility)
    #[serde(other, skip_serializing)]
    Custom,
}

impl EventKind {
    /// The wire tag, for summaries and filters.
    pub fn type_name(&self) -> &'static str {
        match self {
            EventKind::TargetRegistered { .. } => "target.registered",
            EventKind::TargetUpdated { .. } => "target.updated",
            EventKind::TaskCreated { .. } => "task.created",
            EventKind::TaskUpdated { .. } => "task.updated",
            EventKind::TaskCompleted { .. } => "task.completed",
            EventKind::AttemptCreated { .. } => "attempt.created",
            EventKind::AttemptStarted { .. } => "attempt.started",
            EventKind::AttemptSucceeded { .. } => "attempt.succeeded",
            EventKind::AttemptFailed { .. } => "attempt.failed",
            EventKind::AttemptCancelled { .. } => "attempt.cancelled",
            EventKind::AttemptInvalidated { .. } => "attempt.invalidated",
            EventKind::SchedulerSkipped { .. } => "scheduler.skipped",
            EventKind::PrCreated { .. } => "pr.created",
            EventKind::PrMerged { .. } => "pr.merged",
            EventKind::PrClosed { .. } => "pr.closed",
            EventKind::ArtifactCreated { .. } => "artifact.created",
            EventKind::Custom => "custom",
        }
    }

    /// The attempt this event belongs to, when it has one.
    pub fn attempt_id(&self) -> Option<&AttemptId> {
        match self {
            EventKind::TaskCompleted { attempt_id, .. }
            | EventKind::AttemptCreated { attempt_id, .. }
            | EventKind::AttemptStarted { attempt_id }
            | EventKind::AttemptSucceeded { attempt_id }
            | EventKind::AttemptFailed { attempt_id, .. }
            | EventKind::AttemptCancelled { attempt_id, .. }
            | EventKind::AttemptInvalidated { attempt_id, .. }
            | EventKind::PrCreated { attempt_id, .. } => Some(attempt_id),
            EventKind::ArtifactCreated { attempt_id, .. } => attempt_id.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../event_tests.rs"]
mod tests;
