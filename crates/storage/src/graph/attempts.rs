// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Attempt lifecycle and artifact handlers.
//!
//! Terminal transitions are only-if-unset: once an attempt carries a
//! terminal status, later terminal events for it are ignored (there are
//! none in a well-behaved journal, but replay must stay idempotent).

use lv_core::{AttemptStatus, EventKind, FailureKind};

use super::{tasks, AttemptNode, EdgeKind, Graph};
use crate::journal::JournalEntry;

pub(crate) fn apply(graph: &mut Graph, entry: &JournalEntry) {
    match &entry.event.kind {
        EventKind::AttemptCreated { attempt_id, task_id, attempt_number } => {
            tasks::ensure_task(graph, &entry.target, task_id, task_id);
            let key = attempt_id.as_str();
            if !graph.attempts.contains_key(key) {
                graph.attempts.insert(
                    key.to_string(),
                    AttemptNode {
                        id: key.to_string(),
                        target: entry.target.clone(),
                        task_id: task_id.clone(),
                        attempt_number: *attempt_number,
                        created_seq: entry.seq,
                        created_at: entry.event.timestamp,
                        started_at: None,
                        completed_at: None,
                        status: None,
                        terminal_seq: None,
                        failure_kind: None,
                        error_summary: None,
                        invalidated: false,
                        invalidation_reason: None,
                        pr_number: None,
                        events: Vec::new(),
                    },
                );
            }
            let task_key = Graph::task_key(&entry.target, task_id);
            graph.push_edge(&task_key, key, EdgeKind::HasAttempt);
        }

        EventKind::AttemptStarted { attempt_id } => {
            if let Some(node) = graph.attempts.get_mut(attempt_id.as_str()) {
                if node.started_at.is_none() {
                    node.started_at = Some(entry.event.timestamp);
                }
            }
        }

        EventKind::AttemptSucceeded { attempt_id } => {
            finalize(graph, entry, attempt_id.as_str(), AttemptStatus::Succeeded, None, None);
        }

        EventKind::AttemptFailed { attempt_id, failure_kind, error_summary, .. } => {
            let status = if *failure_kind == FailureKind::Timeout {
                AttemptStatus::TimedOut
            } else {
                AttemptStatus::Failed
            };
            finalize(
                graph,
                entry,
                attempt_id.as_str(),
                status,
                Some(*failure_kind),
                Some(error_summary.clone()),
            );
        }

        EventKind::AttemptCancelled { attempt_id, error_summary } => {
            finalize(
                graph,
                entry,
                attempt_id.as_str(),
                AttemptStatus::Cancelled,
                None,
                error_summary.clone(),
            );
        }

        EventKind::AttemptInvalidated { attempt_id, reason } => {
            if let Some(node) = graph.attempts.get_mut(attempt_id.as_str()) {
                // Re-invalidation is a no-op event.
                if !node.invalidated {
                    node.invalidated = true;
                    node.invalidation_reason = Some(reason.clone());
                }
            }
            // Operator intervention also clears pending fetch-failure
            // sentinels from this target's circuit window.
            if let Some(log) = graph.terminal_log.get_mut(&entry.target) {
                log.retain(|e| !e.starts_with(super::FETCH_SENTINEL));
            }
        }

        EventKind::ArtifactCreated { artifact, attempt_id } => {
            if !graph.artifacts.contains_key(&artifact.sha256) {
                graph.artifacts.insert(artifact.sha256.clone(), artifact.clone());
            }
            if let Some(attempt_id) = attempt_id {
                let sha = artifact.sha256.clone();
                graph.push_edge(attempt_id.as_str(), &sha, EdgeKind::Attached);
            }
        }

        _ => {}
    }
}

fn finalize(
    graph: &mut Graph,
    entry: &JournalEntry,
    attempt_id: &str,
    status: AttemptStatus,
    failure_kind: Option<FailureKind>,
    error_summary: Option<String>,
) {
    let Some(node) = graph.attempts.get_mut(attempt_id) else {
        return;
    };
    if node.status.is_some() {
        return;
    }
    node.status = Some(status);
    node.terminal_seq = Some(entry.seq);
    node.completed_at = Some(entry.event.timestamp);
    node.failure_kind = failure_kind;
    node.error_summary = error_summary;

    let log = graph.terminal_log.entry(entry.target.clone()).or_default();
    if !log.iter().any(|id| id == attempt_id) {
        log.push(attempt_id.to_string());
    }
}
