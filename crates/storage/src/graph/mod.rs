// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Graph projection: a queryable view folded from the journal.
//!
//! Projection rows are a cache, not events; the journal remains the
//! source of truth and the graph can always be rebuilt from it. Nodes
//! live in arenas keyed by stable ids; relations are `(from, to, kind)`
//! edge triples, never owning pointers.
//!
//! # Idempotency requirement
//!
//! Every handler MUST be idempotent: applying the same entry twice must
//! produce the same graph as applying it once. Entries can be re-applied
//! on snapshot-mismatch rebuilds and on replay after a crash. Guard
//! inserts with existence checks and state transitions with
//! "only-if-unset" checks.

mod attempts;
mod prs;
mod targets;
mod tasks;

use chrono::{DateTime, Utc};
use lv_core::{ArtifactRef, AttemptStatus, FailureKind, Policy, TaskStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::journal::JournalEntry;

/// How many event headers `summary()` retains.
const RECENT_CAP: usize = 100;

/// Terminal-log marker for a backlog fetch failure. Fetch failures count
/// toward the circuit like attempt failures; an operator invalidation on
/// the target clears them along with the attempt it names.
pub(crate) const FETCH_SENTINEL: &str = "fetch-error:";

/// Lightweight header kept per event for summaries and attempt detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHeader {
    pub seq: u64,
    pub event_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub actor_id: String,
    pub target: String,
}

impl EventHeader {
    fn of(entry: &JournalEntry) -> Self {
        Self {
            seq: entry.seq,
            event_id: entry.event.event_id.to_string(),
            event_type: entry.event.kind.type_name().to_string(),
            timestamp: entry.event.timestamp,
            actor_id: entry.event.actor_id.clone(),
            target: entry.target.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetNode {
    pub id: String,
    pub repo_url: String,
    pub default_branch: String,
    pub policy: Policy,
    pub registered_at: DateTime<Utc>,
    /// Ticks that ended in `scheduler.skipped` for this target.
    #[serde(default)]
    pub skips: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    pub target: String,
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptNode {
    pub id: String,
    pub target: String,
    pub task_id: String,
    pub attempt_number: u32,
    pub created_seq: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// None while the attempt is still running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AttemptStatus>,
    /// Journal position of the terminal event; orders the failure window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_seq: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_summary: Option<String>,
    #[serde(default)]
    pub invalidated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalidation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    /// Ordered headers of every event touching this attempt.
    #[serde(default)]
    pub events: Vec<EventHeader>,
}

impl AttemptNode {
    pub fn is_running(&self) -> bool {
        self.status.is_none() && !self.invalidated
    }

    /// Counts toward `maxAttemptsPerTask` unless invalidated.
    pub fn counts_toward_retry_cap(&self) -> bool {
        !self.invalidated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrState {
    Open,
    Merged,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrNode {
    pub target: String,
    pub number: u64,
    pub url: String,
    pub branch_name: String,
    pub base_branch: String,
    pub head_commit: String,
    pub attempt_id: String,
    pub state: PrState,
    pub opened_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PrNode {
    pub fn is_open_agent_pr(&self) -> bool {
        self.state == PrState::Open
            && self
                .branch_name
                .strip_prefix(lv_core::AGENT_BRANCH_PREFIX)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// target → task
    HasTask,
    /// task → attempt
    HasAttempt,
    /// attempt → pr
    Produced,
    /// attempt → artifact
    Attached,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Counts and recent activity, the `graph-summary` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSummary {
    pub targets: usize,
    pub tasks: usize,
    pub attempts: usize,
    pub running_attempts: usize,
    pub pull_requests: usize,
    pub open_pull_requests: usize,
    pub artifacts: usize,
    pub edges: usize,
    pub last_applied_seq: u64,
    pub recent: Vec<EventHeader>,
}

/// Everything known about one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptDetail {
    pub attempt: AttemptNode,
    pub events: Vec<EventHeader>,
    pub artifacts: Vec<ArtifactRef>,
}

/// Materialized graph built from journal replay. Single writer: exactly
/// one projector applies entries; readers see snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub targets: HashMap<String, TargetNode>,
    /// Keyed `"{target}/{taskId}"`; task ids are unique per target only.
    pub tasks: HashMap<String, TaskNode>,
    pub attempts: HashMap<String, AttemptNode>,
    /// Keyed `"{target}#{number}"`.
    pub prs: HashMap<String, PrNode>,
    pub artifacts: HashMap<String, ArtifactRef>,
    pub edges: Vec<Edge>,
    pub recent: VecDeque<EventHeader>,
    pub last_applied_seq: u64,
    /// Per-target attempt ids in terminal order, for the circuit window.
    pub terminal_log: HashMap<String, Vec<String>>,
}

impl Graph {
    /// Fold one journal entry into the graph.
    pub fn apply(&mut self, entry: &JournalEntry) {
        use lv_core::EventKind;

        match &entry.event.kind {
            EventKind::TargetRegistered { .. }
            | EventKind::TargetUpdated { .. }
            | EventKind::SchedulerSkipped { .. } => targets::apply(self, entry),

            EventKind::TaskCreated { .. }
            | EventKind::TaskUpdated { .. }
            | EventKind::TaskCompleted { .. } => tasks::apply(self, entry),

            EventKind::AttemptCreated { .. }
            | EventKind::AttemptStarted { .. }
            | EventKind::AttemptSucceeded { .. }
            | EventKind::AttemptFailed { .. }
            | EventKind::AttemptCancelled { .. }
            | EventKind::AttemptInvalidated { .. }
            | EventKind::ArtifactCreated { .. } => attempts::apply(self, entry),

            EventKind::PrCreated { .. }
            | EventKind::PrMerged { .. }
            | EventKind::PrClosed { .. } => prs::apply(self, entry),

            // Unknown kinds still advance the cursor and show in recent.
            EventKind::Custom => {}
        }

        if entry.seq > self.last_applied_seq {
            self.last_applied_seq = entry.seq;
            self.recent.push_back(EventHeader::of(entry));
            while self.recent.len() > RECENT_CAP {
                self.recent.pop_front();
            }
        }

        if let Some(attempt_id) = entry.event.kind.attempt_id() {
            if let Some(node) = self.attempts.get_mut(attempt_id.as_str()) {
                if !node.events.iter().any(|h| h.seq == entry.seq) {
                    node.events.push(EventHeader::of(entry));
                }
            }
        }
    }

    /// Replay a batch in order.
    pub fn apply_all<'a>(&mut self, entries: impl IntoIterator<Item = &'a JournalEntry>) {
        for entry in entries {
            self.apply(entry);
        }
    }

    pub(crate) fn push_edge(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let edge = Edge { from: from.to_string(), to: to.to_string(), kind };
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
    }

    pub fn task_key(target: &str, task_id: &str) -> String {
        format!("{target}/{task_id}")
    }

    pub fn pr_key(target: &str, number: u64) -> String {
        format!("{target}#{number}")
    }

    // --- queries ---

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            targets: self.targets.len(),
            tasks: self.tasks.len(),
            attempts: self.attempts.len(),
            running_attempts: self.attempts.values().filter(|a| a.is_running()).count(),
            pull_requests: self.prs.len(),
            open_pull_requests: self.prs.values().filter(|p| p.state == PrState::Open).count(),
            artifacts: self.artifacts.len(),
            edges: self.edges.len(),
            last_applied_seq: self.last_applied_seq,
            recent: self.recent.iter().rev().cloned().collect(),
        }
    }

    /// Look up an attempt by full id or unique prefix (like git hashes).
    pub fn attempt(&self, id: &str) -> Option<AttemptDetail> {
        let node = find_by_prefix(&self.attempts, id)?;
        let artifacts = self
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Attached && e.from == node.id)
            .filter_map(|e| self.artifacts.get(&e.to))
            .cloned()
            .collect();
        Some(AttemptDetail {
            attempt: node.clone(),
            events: node.events.clone(),
            artifacts,
        })
    }

    /// Attempts, newest first, optionally filtered by target.
    pub fn attempts_for_target(&self, target: Option<&str>, limit: usize) -> Vec<AttemptNode> {
        let mut out: Vec<AttemptNode> = self
            .attempts
            .values()
            .filter(|a| target.is_none_or(|t| a.target == t))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_seq.cmp(&a.created_seq));
        out.truncate(limit);
        out
    }

    /// Open PRs whose branch carries the agent prefix.
    pub fn open_prs_for_target(&self, target: &str) -> Vec<PrNode> {
        let mut out: Vec<PrNode> = self
            .prs
            .values()
            .filter(|p| p.target == target && p.is_open_agent_pr())
            .cloned()
            .collect();
        out.sort_by_key(|p| p.number);
        out
    }

    /// Failed or timed-out attempts, newest terminal first.
    pub fn recent_failures(&self, target: Option<&str>, limit: usize) -> Vec<AttemptNode> {
        let mut out: Vec<AttemptNode> = self
            .attempts
            .values()
            .filter(|a| target.is_none_or(|t| a.target == t))
            .filter(|a| a.status.is_some_and(|s| s.counts_as_failure()))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.terminal_seq.cmp(&a.terminal_seq));
        out.truncate(limit);
        out
    }

    /// Non-invalidated attempts for a task, running ones included.
    pub fn attempts_for_task(&self, target: &str, task_id: &str) -> u32 {
        self.attempts
            .values()
            .filter(|a| a.target == target && a.task_id == task_id && a.counts_toward_retry_cap())
            .count() as u32
    }

    /// Attempts with no terminal status, per target.
    pub fn running_attempts(&self, target: &str) -> u32 {
        self.attempts.values().filter(|a| a.target == target && a.is_running()).count() as u32
    }

    /// Next attempt number for a task: 1 + all prior attempts, including
    /// invalidated ones (numbers are never reused).
    pub fn next_attempt_number(&self, target: &str, task_id: &str) -> u32 {
        let prior = self
            .attempts
            .values()
            .filter(|a| a.target == target && a.task_id == task_id)
            .map(|a| a.attempt_number)
            .max()
            .unwrap_or(0);
        prior + 1
    }

    /// Trailing consecutive failures for the circuit check. Walks the
    /// terminal log backwards; invalidated attempts and cancellations are
    /// skipped, a success closes the window. Backlog fetch failures enter
    /// the log as sentinels and count like failures.
    pub fn consecutive_failures(&self, target: &str) -> u32 {
        let Some(log) = self.terminal_log.get(target) else {
            return 0;
        };
        let mut count = 0;
        for entry in log.iter().rev() {
            if entry.starts_with(FETCH_SENTINEL) {
                count += 1;
                continue;
            }
            let Some(node) = self.attempts.get(entry) else {
                continue;
            };
            if node.invalidated {
                continue;
            }
            match node.status {
                Some(status) if status.counts_as_failure() => count += 1,
                Some(AttemptStatus::Cancelled) => continue,
                Some(_) => break,
                None => continue,
            }
        }
        count
    }
}

/// Exact match first, then unique-prefix match.
pub(crate) fn find_by_prefix<'a, V>(map: &'a HashMap<String, V>, id: &str) -> Option<&'a V> {
    if let Some(v) = map.get(id) {
        return Some(v);
    }
    let mut matched = None;
    for (key, value) in map {
        if key.starts_with(id) {
            if matched.is_some() {
                return None; // ambiguous
            }
            matched = Some(value);
        }
    }
    matched
}

#[cfg(test)]
#[path = "../graph_tests/mod.rs"]
mod tests;
