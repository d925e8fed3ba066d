// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-target policy snapshot.
//!
//! The policy is declared in the target repository at
//! `.leviathan/policy.yaml` and observed by the scheduler at the commit it
//! evaluates. The snapshot here is the wire/journal representation; parsing
//! and validation of the YAML document live in `lv-backlog`.

use serde::{Deserialize, Serialize};

/// Guardrails for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Master switch; false suppresses all scheduling for the target.
    #[serde(default = "default_true")]
    pub autonomy_enabled: bool,
    /// Slash-terminated directory prefixes (or concrete file paths) a task
    /// may declare work under.
    #[serde(default)]
    pub allowed_path_prefixes: Vec<String>,
    /// Ceiling on open agent-prefixed PRs on the remote.
    #[serde(rename = "maxOpenPRs", default = "default_one")]
    pub max_open_prs: u32,
    /// Ceiling on attempts without a terminal status.
    #[serde(default = "default_one")]
    pub max_running_attempts: u32,
    /// Ceiling on non-invalidated attempts per task.
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_task: u32,
    /// Consecutive terminal failures that open the circuit.
    #[serde(default = "default_circuit")]
    pub circuit_breaker_failures: u32,
    /// Hard wall-clock bound on one attempt.
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_seconds: u64,
    /// Tick period for this target; floored to one minute by the scheduler.
    #[serde(default = "default_interval")]
    pub schedule_interval_seconds: u64,
    /// Parsed but never acted on; delivery stays human-gated.
    #[serde(default)]
    pub auto_merge: AutoMerge,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            autonomy_enabled: true,
            allowed_path_prefixes: Vec::new(),
            max_open_prs: 1,
            max_running_attempts: 1,
            max_attempts_per_task: default_max_attempts(),
            circuit_breaker_failures: default_circuit(),
            attempt_timeout_seconds: default_attempt_timeout(),
            schedule_interval_seconds: default_interval(),
            auto_merge: AutoMerge::default(),
        }
    }
}

/// Auto-merge configuration. Recognized so policies carrying it stay
/// valid, but the core never merges anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoMerge {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

fn default_max_attempts() -> u32 {
    3
}

fn default_circuit() -> u32 {
    3
}

fn default_attempt_timeout() -> u64 {
    1800
}

fn default_interval() -> u64 {
    300
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
