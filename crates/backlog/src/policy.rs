// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `.leviathan/policy.yaml` reader.
//!
//! Parsing is lenient (unknown keys ignored) unless the document declares
//! a `schemaVersion`, which opts it into strict unknown-field rejection.
//! Validation failures carry the offending field so operators get
//! actionable diagnostics, not a serde one-liner.

use lv_core::Policy;
use serde::Deserialize;
use thiserror::Error;

use crate::paths::normalize_path;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("policy field {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> PolicyError {
    PolicyError::Invalid { field, reason: reason.into() }
}

/// Strict twin of [`Policy`]; only used when `schemaVersion` is present.
/// Spelled out field by field because `deny_unknown_fields` cannot see
/// through `flatten`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StrictPolicyDoc {
    #[serde(rename = "schemaVersion")]
    _schema_version: u32,
    #[serde(default)]
    autonomy_enabled: Option<bool>,
    #[serde(default)]
    allowed_path_prefixes: Vec<String>,
    #[serde(rename = "maxOpenPRs", default)]
    max_open_prs: Option<u32>,
    #[serde(default)]
    max_running_attempts: Option<u32>,
    #[serde(default)]
    max_attempts_per_task: Option<u32>,
    #[serde(default)]
    circuit_breaker_failures: Option<u32>,
    #[serde(default)]
    attempt_timeout_seconds: Option<u64>,
    #[serde(default)]
    schedule_interval_seconds: Option<u64>,
    #[serde(default)]
    auto_merge: Option<lv_core::AutoMerge>,
}

impl From<StrictPolicyDoc> for Policy {
    fn from(doc: StrictPolicyDoc) -> Self {
        let defaults = Policy::default();
        Policy {
            autonomy_enabled: doc.autonomy_enabled.unwrap_or(defaults.autonomy_enabled),
            allowed_path_prefixes: doc.allowed_path_prefixes,
            max_open_prs: doc.max_open_prs.unwrap_or(defaults.max_open_prs),
            max_running_attempts: doc
                .max_running_attempts
                .unwrap_or(defaults.max_running_attempts),
            max_attempts_per_task: doc
                .max_attempts_per_task
                .unwrap_or(defaults.max_attempts_per_task),
            circuit_breaker_failures: doc
                .circuit_breaker_failures
                .unwrap_or(defaults.circuit_breaker_failures),
            attempt_timeout_seconds: doc
                .attempt_timeout_seconds
                .unwrap_or(defaults.attempt_timeout_seconds),
            schedule_interval_seconds: doc
                .schedule_interval_seconds
                .unwrap_or(defaults.schedule_interval_seconds),
            auto_merge: doc.auto_merge.unwrap_or_default(),
        }
    }
}

/// Parse and validate a policy document.
pub fn parse_policy(yaml: &str) -> Result<Policy, PolicyError> {
    let probe: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let strict = probe.get("schemaVersion").is_some();

    let policy: Policy = if strict {
        serde_yaml::from_str::<StrictPolicyDoc>(yaml)?.into()
    } else {
        serde_yaml::from_str(yaml)?
    };
    validate(&policy)?;
    Ok(policy)
}

fn validate(policy: &Policy) -> Result<(), PolicyError> {
    if policy.max_open_prs < 1 {
        return Err(invalid("maxOpenPRs", "must be >= 1"));
    }
    if policy.max_running_attempts < 1 {
        return Err(invalid("maxRunningAttempts", "must be >= 1"));
    }
    if policy.max_attempts_per_task < 1 {
        return Err(invalid("maxAttemptsPerTask", "must be >= 1"));
    }
    if policy.circuit_breaker_failures < 1 {
        return Err(invalid("circuitBreakerFailures", "must be >= 1"));
    }
    if policy.attempt_timeout_seconds == 0 {
        return Err(invalid("attemptTimeoutSeconds", "must be > 0"));
    }
    if policy.schedule_interval_seconds == 0 {
        return Err(invalid("scheduleIntervalSeconds", "must be > 0"));
    }
    if policy.allowed_path_prefixes.is_empty() {
        return Err(invalid("allowedPathPrefixes", "must declare at least one prefix"));
    }
    for prefix in &policy.allowed_path_prefixes {
        normalize_path(prefix)
            .map_err(|err| invalid("allowedPathPrefixes", err.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
