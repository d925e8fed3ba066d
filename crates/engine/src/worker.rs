// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker: one attempt, bounded lifetime, explicit steps.
//!
//! `Init → Created → Started → Cloning → Executing → Committing →
//! Pushing → OpeningPR → WritingBackBacklog → Succeeded`, or
//! `Failed{kind}` from any step past `Started`. The worker never loops;
//! every exit path emits exactly one terminal event (unless even the
//! control plane is unreachable, in which case it leaves a crash
//! artifact and exits non-zero so the attempt is observed as stuck).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lv_adapters::{
    retry, BackoffConfig, ControlError, ControlPlane, CreatePr, HostError, PrHost, RepoAdapter,
    RepoError, TaskEditor,
};
use lv_backlog::{is_path_allowed, mark_task_completed, BACKLOG_PATH};
use lv_core::{
    AttemptNote, Bundle, Clock, Event, EventKind, FailureKind, PullRequestRef,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::context::AttemptContext;

/// How one attempt ended, for the launcher's exit status and for tests.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerOutcome {
    Succeeded { pr: PullRequestRef },
    Failed { kind: FailureKind, summary: String },
    Cancelled,
    /// Terminal event could not be reported; the attempt is stuck until
    /// the retry cap re-issues it.
    SubmitFailed,
}

/// Success payload of the step pipeline.
struct Delivered {
    pr: PullRequestRef,
}

/// Failure carrying the step's kind and a short operator-readable line.
type StepFailure = (FailureKind, String);

pub struct Worker<C: Clock> {
    repo: Arc<dyn RepoAdapter>,
    host: Arc<dyn PrHost>,
    control: Arc<dyn ControlPlane>,
    editor: Arc<dyn TaskEditor>,
    clock: C,
    scratch_root: PathBuf,
    crash_dir: PathBuf,
    pr_backoff: BackoffConfig,
    submit_backoff: BackoffConfig,
}

impl<C: Clock> Worker<C> {
    pub fn new(
        repo: Arc<dyn RepoAdapter>,
        host: Arc<dyn PrHost>,
        control: Arc<dyn ControlPlane>,
        editor: Arc<dyn TaskEditor>,
        clock: C,
        scratch_root: impl Into<PathBuf>,
    ) -> Self {
        let scratch_root = scratch_root.into();
        let crash_dir = scratch_root.join("crash");
        Self {
            repo,
            host,
            control,
            editor,
            clock,
            scratch_root,
            crash_dir,
            pr_backoff: BackoffConfig::default(),
            submit_backoff: BackoffConfig::default(),
        }
    }

    pub fn with_pr_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.pr_backoff = backoff;
        self
    }

    pub fn with_submit_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.submit_backoff = backoff;
        self
    }

    /// Run the attempt to a terminal. Cancellation and the per-attempt
    /// timeout both produce terminals; only an unreachable control plane
    /// does not.
    pub async fn run(&self, ctx: AttemptContext, cancel: CancellationToken) -> WorkerOutcome {
        let actor = ctx.actor();

        // Opening bundle: created (when hand-dispatched) + started.
        let mut opening = Vec::new();
        if ctx.emit_created {
            opening.push(Event::now(
                &self.clock,
                actor.as_str(),
                EventKind::AttemptCreated {
                    attempt_id: ctx.attempt_id,
                    task_id: ctx.task.id.clone(),
                    attempt_number: ctx.attempt_number,
                },
            ));
        }
        opening.push(Event::now(
            &self.clock,
            actor.as_str(),
            EventKind::AttemptStarted { attempt_id: ctx.attempt_id },
        ));
        if !self.submit(&ctx, opening).await {
            return WorkerOutcome::SubmitFailed;
        }

        let workdir = self.scratch_root.join(ctx.attempt_id.as_str());
        let timeout = Duration::from_secs(ctx.policy.attempt_timeout_seconds);
        let started = self.clock.now();

        let result = tokio::select! {
            () = cancel.cancelled() => None,
            outcome = tokio::time::timeout(timeout, self.execute(&ctx, &workdir)) => {
                Some(outcome.unwrap_or_else(|_| {
                    Err((
                        FailureKind::Timeout,
                        format!("attempt exceeded {}s", ctx.policy.attempt_timeout_seconds),
                    ))
                }))
            }
        };

        // The clone is per-attempt; release it no matter how we exit.
        let _ = tokio::fs::remove_dir_all(&workdir).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let (events, outcome) = match result {
            None => {
                info!(attempt = %ctx.attempt_id, elapsed_ms, "attempt cancelled");
                (
                    vec![Event::now(
                        &self.clock,
                        actor.as_str(),
                        EventKind::AttemptCancelled {
                            attempt_id: ctx.attempt_id,
                            error_summary: Some("cancel signal received".to_string()),
                        },
                    )],
                    WorkerOutcome::Cancelled,
                )
            }
            Some(Ok(delivered)) => {
                info!(
                    attempt = %ctx.attempt_id,
                    pr = delivered.pr.number,
                    elapsed_ms,
                    "attempt succeeded"
                );
                (
                    vec![
                        Event::now(
                            &self.clock,
                            actor.as_str(),
                            EventKind::PrCreated {
                                attempt_id: ctx.attempt_id,
                                pr: delivered.pr.clone(),
                            },
                        ),
                        Event::now(
                            &self.clock,
                            actor.as_str(),
                            EventKind::TaskCompleted {
                                task_id: ctx.task.id.clone(),
                                attempt_id: ctx.attempt_id,
                            },
                        ),
                        Event::now(
                            &self.clock,
                            actor.as_str(),
                            EventKind::AttemptSucceeded { attempt_id: ctx.attempt_id },
                        ),
                    ],
                    WorkerOutcome::Succeeded { pr: delivered.pr },
                )
            }
            Some(Err((kind, summary))) => {
                warn!(
                    attempt = %ctx.attempt_id,
                    failure_kind = %kind,
                    elapsed_ms,
                    "attempt failed: {summary}"
                );
                (
                    vec![Event::now(
                        &self.clock,
                        actor.as_str(),
                        EventKind::AttemptFailed {
                            attempt_id: ctx.attempt_id,
                            failure_kind: kind,
                            error_summary: summary.clone(),
                            artifact: None,
                        },
                    )],
                    WorkerOutcome::Failed { kind, summary },
                )
            }
        };

        if !self.submit(&ctx, events).await {
            return WorkerOutcome::SubmitFailed;
        }
        outcome
    }

    /// The Cloning → WritingBackBacklog pipeline.
    async fn execute(&self, ctx: &AttemptContext, workdir: &Path) -> Result<Delivered, StepFailure> {
        let locator = ctx.locator();

        // -- Cloning --
        info!(attempt = %ctx.attempt_id, step = "cloning", target = %ctx.target, "worker step");
        self.repo.clone_shallow(&locator, workdir).await.map_err(|err| match err {
            RepoError::Auth => (FailureKind::Auth, err.to_string()),
            err => (FailureKind::Clone, err.to_string()),
        })?;

        // -- Executing --
        info!(attempt = %ctx.attempt_id, step = "executing", task = %ctx.task.id, "worker step");
        self.editor
            .edit(workdir, &ctx.task)
            .await
            .map_err(|err| (FailureKind::Execute, err.to_string()))?;

        let changed = self
            .repo
            .changed_paths(workdir)
            .await
            .map_err(|err| (FailureKind::Execute, err.to_string()))?;
        if changed.is_empty() {
            return Err((FailureKind::Execute, "editor modified no files".to_string()));
        }
        // Boundary-safe re-verification of every modified path. Nothing
        // out of scope may ever be pushed.
        for path in &changed {
            if !is_path_allowed(path, &ctx.task.allowed_paths) {
                return Err((
                    FailureKind::ScopeViolation,
                    format!("modified path outside task scope: {path}"),
                ));
            }
        }

        // -- Committing --
        info!(attempt = %ctx.attempt_id, step = "committing", files = changed.len(), "worker step");
        self.repo
            .stage(workdir, &changed, true)
            .await
            .map_err(|err| (FailureKind::Execute, err.to_string()))?;
        self.repo
            .commit(workdir, &ctx.commit_message())
            .await
            .map_err(|err| (FailureKind::Execute, err.to_string()))?;

        // -- Pushing --
        let branch = ctx.branch();
        info!(attempt = %ctx.attempt_id, step = "pushing", branch = %branch, "worker step");
        self.repo.push_new_branch(&locator, workdir, &branch).await.map_err(|err| match err {
            RepoError::Auth => (FailureKind::Auth, err.to_string()),
            err => (FailureKind::Push, err.to_string()),
        })?;

        // -- OpeningPR --
        info!(attempt = %ctx.attempt_id, step = "openingPr", "worker step");
        let pr = self.open_or_reuse_pr(ctx, &branch).await?;

        // -- WritingBackBacklog --
        info!(attempt = %ctx.attempt_id, step = "writingBackBacklog", "worker step");
        self.write_back(ctx, workdir, &locator, &branch, &pr).await?;

        Ok(Delivered { pr })
    }

    async fn open_or_reuse_pr(
        &self,
        ctx: &AttemptContext,
        branch: &str,
    ) -> Result<PullRequestRef, StepFailure> {
        let request = CreatePr {
            head_branch: branch.to_string(),
            base_branch: ctx.base_branch.clone(),
            title: format!("{} ({})", ctx.task.title, ctx.task.id),
            body: format!(
                "Automated change for task `{}` (attempt `{}`).\n\nDelivery is PR-based; review and merge is yours.",
                ctx.task.id, ctx.attempt_id,
            ),
        };
        let created = retry(&self.pr_backoff, HostError::is_retryable, || {
            self.host.create_pr(&ctx.repo_url, &request)
        })
        .await;
        match created {
            Ok(pr) => Ok(pr),
            // A PR for this head already exists: reuse it.
            Err(HostError::Conflict) => self
                .host
                .find_open_pr(&ctx.repo_url, branch)
                .await
                .map_err(|err| (FailureKind::PrOpen, err.to_string()))?
                .ok_or_else(|| {
                    (
                        FailureKind::PrOpen,
                        "host reported an existing PR but none is open for this head".to_string(),
                    )
                }),
            Err(HostError::Auth) => Err((FailureKind::Auth, "PR host rejected token".to_string())),
            Err(err) => Err((FailureKind::PrOpen, err.to_string())),
        }
    }

    async fn write_back(
        &self,
        ctx: &AttemptContext,
        workdir: &Path,
        locator: &lv_adapters::RepoLocator,
        branch: &str,
        pr: &PullRequestRef,
    ) -> Result<(), StepFailure> {
        let fail = |err: &dyn std::fmt::Display| {
            (FailureKind::BacklogWriteback, err.to_string())
        };

        let backlog_file = workdir.join(BACKLOG_PATH);
        let yaml = tokio::fs::read_to_string(&backlog_file)
            .await
            .map_err(|err| fail(&err))?;
        let note = AttemptNote {
            attempt_id: ctx.attempt_id.to_string(),
            branch: branch.to_string(),
            completed_at: self.clock.now_utc().to_rfc3339(),
        };
        let updated = mark_task_completed(&yaml, &ctx.task.id, &note).map_err(|err| fail(&err))?;
        tokio::fs::write(&backlog_file, updated).await.map_err(|err| fail(&err))?;

        self.repo
            .stage(workdir, &[BACKLOG_PATH.to_string()], true)
            .await
            .map_err(|err| fail(&err))?;
        self.repo
            .commit(workdir, &format!("leviathan: record completion of {}", ctx.task.id))
            .await
            .map_err(|err| fail(&err))?;
        self.repo
            .push_new_branch(locator, workdir, branch)
            .await
            .map_err(|err| fail(&err))?;
        self.host
            .update_pr(
                &ctx.repo_url,
                pr.number,
                &format!(
                    "Automated change for task `{}` (attempt `{}`).\n\nBacklog writeback applied: the task is recorded as completed on this branch.",
                    ctx.task.id, ctx.attempt_id,
                ),
            )
            .await
            .map_err(|err| fail(&err))?;
        Ok(())
    }

    /// Submit one bundle; on exhausted retries write a crash artifact and
    /// report failure so the caller exits non-zero.
    async fn submit(&self, ctx: &AttemptContext, events: Vec<Event>) -> bool {
        if events.is_empty() {
            return true;
        }
        let bundle = Bundle::new(ctx.target.clone(), events);
        let submitted = retry(&self.submit_backoff, ControlError::is_retryable, || {
            self.control.submit(&bundle)
        })
        .await;
        match submitted {
            Ok(_) => true,
            Err(err) => {
                error!(
                    attempt = %ctx.attempt_id,
                    error = %err,
                    "bundle submission exhausted retries; writing crash artifact"
                );
                self.write_crash_artifact(ctx, &bundle, &err);
                false
            }
        }
    }

    fn write_crash_artifact(
        &self,
        ctx: &AttemptContext,
        bundle: &Bundle,
        err: &dyn std::fmt::Display,
    ) {
        let report = serde_json::json!({
            "attemptId": ctx.attempt_id.as_str(),
            "target": ctx.target,
            "error": err.to_string(),
            "bundle": bundle,
        });
        let path = self.crash_dir.join(format!("crash-{}.json", ctx.attempt_id.short(8)));
        if std::fs::create_dir_all(&self.crash_dir).is_ok() {
            if let Ok(body) = serde_json::to_vec_pretty(&report) {
                let _ = std::fs::write(&path, body);
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
