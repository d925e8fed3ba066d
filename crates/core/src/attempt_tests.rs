// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    succeeded = { AttemptStatus::Succeeded, false },
    failed = { AttemptStatus::Failed, true },
    timed_out = { AttemptStatus::TimedOut, true },
    cancelled = { AttemptStatus::Cancelled, false },
)]
fn circuit_counts_failures_and_timeouts(status: AttemptStatus, counts: bool) {
    assert_eq!(status.counts_as_failure(), counts);
}

#[test]
fn branch_encodes_task_and_attempt() {
    assert_eq!(attempt_branch("fix-readme", "att-1"), "agent/fix-readme-att-1");
}

#[test]
fn failure_kind_wire_form_is_camel_case() {
    assert_eq!(
        serde_json::to_string(&FailureKind::ScopeViolation).unwrap(),
        "\"scopeViolation\""
    );
    assert_eq!(FailureKind::BacklogWriteback.to_string(), "backlogWriteback");
}
