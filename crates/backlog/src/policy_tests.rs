// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const GOOD: &str = r#"
autonomyEnabled: true
allowedPathPrefixes:
  - docs/
  - tests/unit/
maxOpenPRs: 1
maxRunningAttempts: 1
maxAttemptsPerTask: 2
circuitBreakerFailures: 2
attemptTimeoutSeconds: 900
scheduleIntervalSeconds: 300
"#;

#[test]
fn parses_a_full_policy() {
    let policy = parse_policy(GOOD).unwrap();
    assert!(policy.autonomy_enabled);
    assert_eq!(policy.allowed_path_prefixes, vec!["docs/", "tests/unit/"]);
    assert_eq!(policy.max_open_prs, 1);
    assert_eq!(policy.max_attempts_per_task, 2);
    assert_eq!(policy.circuit_breaker_failures, 2);
    assert_eq!(policy.attempt_timeout_seconds, 900);
}

#[test]
fn minimal_policy_gets_defaults() {
    let policy = parse_policy("allowedPathPrefixes: [\"docs/\"]\n").unwrap();
    assert!(policy.autonomy_enabled);
    assert_eq!(policy.max_open_prs, 1);
    assert!(!policy.auto_merge.enabled);
}

#[parameterized(
    zero_prs = { "allowedPathPrefixes: [\"docs/\"]\nmaxOpenPRs: 0\n", "maxOpenPRs" },
    zero_attempts = { "allowedPathPrefixes: [\"docs/\"]\nmaxAttemptsPerTask: 0\n", "maxAttemptsPerTask" },
    zero_circuit = { "allowedPathPrefixes: [\"docs/\"]\ncircuitBreakerFailures: 0\n", "circuitBreakerFailures" },
    zero_timeout = { "allowedPathPrefixes: [\"docs/\"]\nattemptTimeoutSeconds: 0\n", "attemptTimeoutSeconds" },
    zero_interval = { "allowedPathPrefixes: [\"docs/\"]\nscheduleIntervalSeconds: 0\n", "scheduleIntervalSeconds" },
    no_prefixes = { "maxOpenPRs: 1\n", "allowedPathPrefixes" },
)]
fn rejects_out_of_range_fields(yaml: &str, field: &str) {
    match parse_policy(yaml) {
        Err(PolicyError::Invalid { field: f, .. }) => assert_eq!(f, field),
        other => panic!("expected Invalid({field}), got {other:?}"),
    }
}

#[test]
fn rejects_traversal_in_prefixes() {
    let yaml = "allowedPathPrefixes: [\"docs/../secrets/\"]\n";
    assert!(matches!(
        parse_policy(yaml),
        Err(PolicyError::Invalid { field: "allowedPathPrefixes", .. })
    ));
}

#[test]
fn lenient_without_schema_version_ignores_unknown_fields() {
    let yaml = "allowedPathPrefixes: [\"docs/\"]\nfutureKnob: 42\n";
    assert!(parse_policy(yaml).is_ok());
}

#[test]
fn strict_with_schema_version_rejects_unknown_fields() {
    let yaml = "schemaVersion: 1\nallowedPathPrefixes: [\"docs/\"]\nfutureKnob: 42\n";
    assert!(matches!(parse_policy(yaml), Err(PolicyError::Parse(_))));
}

#[test]
fn strict_with_schema_version_accepts_known_fields() {
    let yaml = "schemaVersion: 1\nallowedPathPrefixes: [\"docs/\"]\nmaxOpenPRs: 2\n";
    let policy = parse_policy(yaml).unwrap();
    assert_eq!(policy.max_open_prs, 2);
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    assert!(matches!(parse_policy(": : :"), Err(PolicyError::Parse(_))));
}

#[test]
fn auto_merge_defaults_to_disabled() {
    let policy = parse_policy(GOOD).unwrap();
    assert!(!policy.auto_merge.enabled);

    let yaml = "allowedPathPrefixes: [\"docs/\"]\nautoMerge:\n  enabled: true\n";
    let policy = parse_policy(yaml).unwrap();
    // Parsed and carried, never acted on.
    assert!(policy.auto_merge.enabled);
}
