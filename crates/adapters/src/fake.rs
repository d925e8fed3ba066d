// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted fakes for the adapter traits.
//!
//! Each fake records its calls and can be primed with canned responses
//! or failures, so scheduler and worker tests never touch the network or
//! the git binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lv_core::{Bundle, PullRequestRef, TaskSpec};
use parking_lot::Mutex;

use crate::control::{ControlError, ControlPlane, IngestReceipt};
use crate::editor::{EditorError, TaskEditor};
use crate::host::{CreatePr, HostError, PrHost};
use crate::repo::{RepoAdapter, RepoError, RepoLocator};

/// In-memory repository: scripted file contents, no real git.
#[derive(Default, Clone)]
pub struct FakeRepo {
    inner: Arc<Mutex<FakeRepoState>>,
}

#[derive(Default)]
struct FakeRepoState {
    /// path → content served by `fetch_file`.
    files: HashMap<String, String>,
    /// Paths reported by `changed_paths` after an edit.
    changed: Vec<String>,
    fetch_fails: bool,
    clone_fails: bool,
    auth_fails: bool,
    push_collides: bool,
    staged: Vec<Vec<String>>,
    commits: Vec<String>,
    pushed_branches: Vec<String>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_file(&self, path: &str, content: &str) {
        self.inner.lock().files.insert(path.to_string(), content.to_string());
    }

    pub fn set_changed_paths(&self, paths: &[&str]) {
        self.inner.lock().changed = paths.iter().map(|p| p.to_string()).collect();
    }

    pub fn fail_fetch(&self) {
        self.inner.lock().fetch_fails = true;
    }

    pub fn fail_clone(&self) {
        self.inner.lock().clone_fails = true;
    }

    pub fn fail_auth(&self) {
        self.inner.lock().auth_fails = true;
    }

    pub fn collide_push(&self) {
        self.inner.lock().push_collides = true;
    }

    pub fn pushed_branches(&self) -> Vec<String> {
        self.inner.lock().pushed_branches.clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.inner.lock().commits.clone()
    }

    pub fn staged(&self) -> Vec<Vec<String>> {
        self.inner.lock().staged.clone()
    }
}

#[async_trait]
impl RepoAdapter for FakeRepo {
    async fn fetch_file(&self, _repo: &RepoLocator, path: &str) -> Result<String, RepoError> {
        let state = self.inner.lock();
        if state.auth_fails {
            return Err(RepoError::Auth);
        }
        if state.fetch_fails {
            return Err(RepoError::Git { op: "clone", detail: "remote unreachable".into() });
        }
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| RepoError::FileNotFound(path.to_string()))
    }

    async fn clone_shallow(&self, _repo: &RepoLocator, dest: &Path) -> Result<(), RepoError> {
        let state = self.inner.lock();
        if state.auth_fails {
            return Err(RepoError::Auth);
        }
        if state.clone_fails {
            return Err(RepoError::Git { op: "clone", detail: "remote unreachable".into() });
        }
        // Materialize scripted files so editors and writeback have a tree.
        for (path, content) in &state.files {
            let full = dest.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(full, content)?;
        }
        Ok(())
    }

    async fn head_commit(&self, _workdir: &Path) -> Result<String, RepoError> {
        Ok("f4ke000000000000000000000000000000000000".to_string())
    }

    async fn changed_paths(&self, _workdir: &Path) -> Result<Vec<String>, RepoError> {
        Ok(self.inner.lock().changed.clone())
    }

    async fn stage(&self, _workdir: &Path, paths: &[String], _force: bool) -> Result<(), RepoError> {
        self.inner.lock().staged.push(paths.to_vec());
        Ok(())
    }

    async fn commit(&self, _workdir: &Path, message: &str) -> Result<String, RepoError> {
        let mut state = self.inner.lock();
        state.commits.push(message.to_string());
        Ok(format!("c0mmit{:034}", state.commits.len()))
    }

    async fn push_new_branch(
        &self,
        _repo: &RepoLocator,
        _workdir: &Path,
        branch: &str,
    ) -> Result<(), RepoError> {
        let mut state = self.inner.lock();
        if state.push_collides {
            return Err(RepoError::BranchExists(branch.to_string()));
        }
        state.pushed_branches.push(branch.to_string());
        Ok(())
    }
}

/// In-memory PR host.
#[derive(Default, Clone)]
pub struct FakeHost {
    inner: Arc<Mutex<FakeHostState>>,
}

#[derive(Default)]
struct FakeHostState {
    open: Vec<PullRequestRef>,
    created: Vec<CreatePr>,
    updated: Vec<(u64, String)>,
    next_number: u64,
    create_conflicts: bool,
    fail_create: bool,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_pr(&self, branch: &str) {
        let mut state = self.inner.lock();
        state.next_number += 1;
        let number = state.next_number;
        state.open.push(PullRequestRef {
            number,
            url: format!("https://host.test/pr/{number}"),
            branch_name: branch.to_string(),
            base_branch: "main".to_string(),
            head_commit: "abc".to_string(),
        });
    }

    /// Next create call returns `Conflict`, as GitHub does when a PR for
    /// the head already exists.
    pub fn conflict_on_create(&self) {
        self.inner.lock().create_conflicts = true;
    }

    pub fn fail_create(&self) {
        self.inner.lock().fail_create = true;
    }

    pub fn created(&self) -> Vec<CreatePr> {
        self.inner.lock().created.clone()
    }

    pub fn updated(&self) -> Vec<(u64, String)> {
        self.inner.lock().updated.clone()
    }
}

#[async_trait]
impl PrHost for FakeHost {
    async fn list_open_prs(
        &self,
        _repo_url: &str,
        branch_prefix: &str,
    ) -> Result<Vec<PullRequestRef>, HostError> {
        let wanted = format!("{branch_prefix}/");
        Ok(self
            .inner
            .lock()
            .open
            .iter()
            .filter(|pr| pr.branch_name.starts_with(&wanted))
            .cloned()
            .collect())
    }

    async fn create_pr(
        &self,
        _repo_url: &str,
        req: &CreatePr,
    ) -> Result<PullRequestRef, HostError> {
        let mut state = self.inner.lock();
        if state.fail_create {
            return Err(HostError::Api { status: 500, message: "host exploded".into() });
        }
        if state.create_conflicts || state.open.iter().any(|pr| pr.branch_name == req.head_branch)
        {
            return Err(HostError::Conflict);
        }
        state.created.push(req.clone());
        state.next_number += 1;
        let number = state.next_number;
        let pr = PullRequestRef {
            number,
            url: format!("https://host.test/pr/{number}"),
            branch_name: req.head_branch.clone(),
            base_branch: req.base_branch.clone(),
            head_commit: "abc".to_string(),
        };
        state.open.push(pr.clone());
        Ok(pr)
    }

    async fn find_open_pr(
        &self,
        _repo_url: &str,
        head_branch: &str,
    ) -> Result<Option<PullRequestRef>, HostError> {
        Ok(self
            .inner
            .lock()
            .open
            .iter()
            .find(|pr| pr.branch_name == head_branch)
            .cloned())
    }

    async fn update_pr(&self, _repo_url: &str, number: u64, body: &str) -> Result<(), HostError> {
        self.inner.lock().updated.push((number, body.to_string()));
        Ok(())
    }
}

/// In-memory control plane: collects bundles, optionally failing first.
#[derive(Default, Clone)]
pub struct FakeControlPlane {
    inner: Arc<Mutex<FakeControlState>>,
}

#[derive(Default)]
struct FakeControlState {
    bundles: Vec<Bundle>,
    fail_next: u32,
    seq: u64,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` submissions with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().fail_next = n;
    }

    pub fn bundles(&self) -> Vec<Bundle> {
        self.inner.lock().bundles.clone()
    }

    /// Flattened event type names across all accepted bundles, in order.
    pub fn event_types(&self) -> Vec<String> {
        self.inner
            .lock()
            .bundles
            .iter()
            .flat_map(|b| b.events.iter())
            .map(|e| e.kind.type_name().to_string())
            .collect()
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn submit(&self, bundle: &Bundle) -> Result<IngestReceipt, ControlError> {
        let mut state = self.inner.lock();
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(ControlError::RateLimited);
        }
        let first = state.seq + 1;
        state.seq += bundle.events.len() as u64;
        let last = state.seq;
        state.bundles.push(bundle.clone());
        Ok(IngestReceipt { first_seq: first, last_seq: last, tip_hash: format!("tip-{last}") })
    }
}

/// Editor that writes fixed content into scripted paths.
#[derive(Clone)]
pub struct FakeEditor {
    paths: Vec<String>,
    fail: bool,
}

impl FakeEditor {
    /// Writes a line of placeholder content to each path.
    pub fn writing(paths: &[&str]) -> Self {
        Self { paths: paths.iter().map(|p| p.to_string()).collect(), fail: false }
    }

    pub fn failing() -> Self {
        Self { paths: Vec::new(), fail: true }
    }
}

#[async_trait]
impl TaskEditor for FakeEditor {
    async fn edit(&self, workdir: &Path, task: &TaskSpec) -> Result<Vec<String>, EditorError> {
        if self.fail {
            return Err(EditorError::Failed("scripted editor failure".to_string()));
        }
        for path in &self.paths {
            let full: PathBuf = workdir.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full, format!("edited for task {}\n", task.id))?;
        }
        Ok(self.paths.clone())
    }
}
