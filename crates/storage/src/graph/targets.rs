// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target registration and scheduler-skip handlers.

use lv_core::EventKind;

use super::{Graph, TargetNode};
use crate::journal::JournalEntry;

pub(crate) fn apply(graph: &mut Graph, entry: &JournalEntry) {
    match &entry.event.kind {
        EventKind::TargetRegistered { target, repo_url, default_branch, policy } => {
            // Registration is first-write-wins; later changes use
            // target.updated.
            if !graph.targets.contains_key(target) {
                graph.targets.insert(
                    target.clone(),
                    TargetNode {
                        id: target.clone(),
                        repo_url: repo_url.clone(),
                        default_branch: default_branch.clone(),
                        policy: policy.clone(),
                        registered_at: entry.event.timestamp,
                        skips: 0,
                    },
                );
            }
        }

        EventKind::TargetUpdated { target, repo_url, default_branch, policy } => {
            if let Some(node) = graph.targets.get_mut(target) {
                if let Some(url) = repo_url {
                    node.repo_url = url.clone();
                }
                if let Some(branch) = default_branch {
                    node.default_branch = branch.clone();
                }
                if let Some(policy) = policy {
                    node.policy = policy.clone();
                }
            }
        }

        EventKind::SchedulerSkipped { reason, .. } => {
            // Guarded by seq so replay does not double-count.
            let fresh = entry.seq > graph.last_applied_seq;
            if let Some(node) = graph.targets.get_mut(&entry.target) {
                if fresh {
                    node.skips += 1;
                }
            }
            // Fetch failures count toward the circuit window.
            if fresh && *reason == lv_core::SkipReason::FetchError {
                graph
                    .terminal_log
                    .entry(entry.target.clone())
                    .or_default()
                    .push(format!("{}{}", super::FETCH_SENTINEL, entry.seq));
            }
        }

        _ => {}
    }
}
