// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull request references as observed from worker events.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestRef {
    pub number: u64,
    pub url: String,
    pub branch_name: String,
    pub base_branch: String,
    pub head_commit: String,
}

impl PullRequestRef {
    /// Whether this PR was opened by the agent (fingerprint match).
    pub fn is_agent_branch(&self) -> bool {
        self.branch_name
            .strip_prefix(crate::attempt::AGENT_BRANCH_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
    }
}
