// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull request lifecycle handlers.

use lv_core::EventKind;

use super::{EdgeKind, Graph, PrNode, PrState};
use crate::journal::JournalEntry;

pub(crate) fn apply(graph: &mut Graph, entry: &JournalEntry) {
    match &entry.event.kind {
        EventKind::PrCreated { attempt_id, pr } => {
            let key = Graph::pr_key(&entry.target, pr.number);
            if !graph.prs.contains_key(&key) {
                graph.prs.insert(
                    key.clone(),
                    PrNode {
                        target: entry.target.clone(),
                        number: pr.number,
                        url: pr.url.clone(),
                        branch_name: pr.branch_name.clone(),
                        base_branch: pr.base_branch.clone(),
                        head_commit: pr.head_commit.clone(),
                        attempt_id: attempt_id.to_string(),
                        state: PrState::Open,
                        opened_at: entry.event.timestamp,
                        closed_at: None,
                        merged_at: None,
                    },
                );
            }
            if let Some(attempt) = graph.attempts.get_mut(attempt_id.as_str()) {
                if attempt.pr_number.is_none() {
                    attempt.pr_number = Some(pr.number);
                }
            }
            graph.push_edge(attempt_id.as_str(), &key, EdgeKind::Produced);
        }

        EventKind::PrMerged { number } => {
            let key = Graph::pr_key(&entry.target, *number);
            if let Some(pr) = graph.prs.get_mut(&key) {
                if pr.state == PrState::Open {
                    pr.state = PrState::Merged;
                    pr.merged_at = Some(entry.event.timestamp);
                    pr.closed_at = Some(entry.event.timestamp);
                }
            }
        }

        EventKind::PrClosed { number } => {
            let key = Graph::pr_key(&entry.target, *number);
            if let Some(pr) = graph.prs.get_mut(&key) {
                if pr.state == PrState::Open {
                    pr.state = PrState::Closed;
                    pr.closed_at = Some(entry.event.timestamp);
                }
            }
        }

        _ => {}
    }
}
