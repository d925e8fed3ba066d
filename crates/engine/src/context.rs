// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fully-resolved context handed from the scheduler to a worker.

use lv_adapters::{RepoAuth, RepoLocator};
use lv_core::{AttemptId, Policy, TaskSpec};

/// Everything one attempt needs. Secrets stay by reference: the context
/// names the environment variable, the worker resolves it at startup.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub target: String,
    pub repo_url: String,
    pub base_branch: String,
    pub task: TaskSpec,
    pub attempt_id: AttemptId,
    pub attempt_number: u32,
    pub policy: Policy,
    /// Environment variable holding the git/PR-host token.
    pub token_env: Option<String>,
    /// Username paired with the token in the clone URL.
    pub token_user: String,
    /// Whether the worker must emit `attempt.created` itself (hand-made
    /// contexts); the scheduler normally emits it before dispatch.
    pub emit_created: bool,
}

impl AttemptContext {
    /// Actor id stamped on events this worker emits.
    pub fn actor(&self) -> String {
        format!("worker:{}", self.attempt_id)
    }

    /// Branch the attempt pushes: `agent/<taskId>-<attemptId>`.
    pub fn branch(&self) -> String {
        lv_core::attempt_branch(&self.task.id, self.attempt_id.as_str())
    }

    /// Commit message derived from the task and attempt ids.
    pub fn commit_message(&self) -> String {
        format!("leviathan: {} (attempt {})", self.task.id, self.attempt_id)
    }

    /// Repo locator with credentials resolved from the environment.
    pub fn locator(&self) -> RepoLocator {
        let auth = self
            .token_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty())
            .map(|token| RepoAuth { username: self.token_user.clone(), token });
        RepoLocator { url: self.repo_url.clone(), branch: self.base_branch.clone(), auth }
    }
}
