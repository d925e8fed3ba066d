// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod attempts;
mod counting;
mod determinism;

use super::*;
use lv_core::{Event, EventKind, FakeClock};

/// Feeds hand-built journal entries to a graph; chain fields are dummies
/// because the projection never reads them.
pub(crate) struct Feed {
    seq: u64,
    pub clock: FakeClock,
}

impl Feed {
    pub fn new() -> Self {
        let clock = FakeClock::new();
        clock.set_epoch_ms(1_700_000_000_000);
        Self { seq: 0, clock }
    }

    pub fn entry(&mut self, target: &str, kind: EventKind) -> JournalEntry {
        self.seq += 1;
        self.clock.advance(std::time::Duration::from_secs(1));
        JournalEntry {
            seq: self.seq,
            target: target.to_string(),
            prev_hash: String::new(),
            hash: String::new(),
            event: Event::now(&self.clock, "test", kind),
        }
    }
}

use crate::journal::JournalEntry;
use lv_core::{AttemptId, PullRequestRef};

pub(crate) fn created(feed: &mut Feed, target: &str, task: &str, attempt: &str, n: u32) -> JournalEntry {
    feed.entry(
        target,
        EventKind::AttemptCreated {
            attempt_id: AttemptId::from_string(attempt),
            task_id: task.to_string(),
            attempt_number: n,
        },
    )
}

pub(crate) fn succeeded(feed: &mut Feed, target: &str, attempt: &str) -> JournalEntry {
    feed.entry(target, EventKind::AttemptSucceeded { attempt_id: AttemptId::from_string(attempt) })
}

pub(crate) fn failed(feed: &mut Feed, target: &str, attempt: &str) -> JournalEntry {
    feed.entry(
        target,
        EventKind::AttemptFailed {
            attempt_id: AttemptId::from_string(attempt),
            failure_kind: lv_core::FailureKind::Execute,
            error_summary: "editor exploded".to_string(),
            artifact: None,
        },
    )
}

pub(crate) fn pr_created(feed: &mut Feed, target: &str, attempt: &str, number: u64) -> JournalEntry {
    feed.entry(
        target,
        EventKind::PrCreated {
            attempt_id: AttemptId::from_string(attempt),
            pr: PullRequestRef {
                number,
                url: format!("https://example.test/pr/{number}"),
                branch_name: format!("agent/task-{attempt}"),
                base_branch: "main".to_string(),
                head_commit: "abc123".to_string(),
            },
        },
    )
}
