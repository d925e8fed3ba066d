// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: one tick, one target, at most one dispatch.
//!
//! Each tick walks the guardrails in a fixed order (autonomy gate,
//! circuit, PR cap, running cap, backlog fetch, selection, retry cap)
//! and every early exit is recorded as a `scheduler.skipped` event, so
//! the journal explains why nothing happened just as well as why
//! something did. Ticks for the same target never overlap (a lease
//! guards the whole procedure); ticks for different targets run freely.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lv_adapters::{ControlError, ControlPlane, PrHost, RepoAdapter, RepoLocator};
use lv_backlog::{parse_policy, select_candidate, Backlog, BACKLOG_PATH, POLICY_PATH};
use lv_core::{AttemptId, Bundle, Clock, Event, EventKind, SkipReason, AGENT_BRANCH_PREFIX};
use lv_storage::{Graph, TargetNode};
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::autonomy::AutonomySwitch;
use crate::context::AttemptContext;
use crate::launcher::WorkerLauncher;

/// Actor id stamped on scheduler-emitted events.
const ACTOR: &str = "scheduler";

/// Floor on the tick period; ticks may be coalesced or skipped.
const MIN_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum TickError {
    /// Even the skip event could not be recorded.
    #[error("control plane rejected scheduler events: {0}")]
    Submit(#[from] ControlError),
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Dispatched { attempt_id: AttemptId, task_id: String },
    Skipped(SkipReason),
    /// A previous tick for this target is still running; nothing emitted.
    Overlapping,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Environment variable naming the git/PR-host token.
    pub token_env: Option<String>,
    /// Username paired with the token in clone URLs.
    pub token_user: String,
    /// How often the run loop looks for due targets.
    pub poll_interval: Duration,
    /// Floor applied to per-target `scheduleIntervalSeconds`.
    pub min_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            token_env: Some("LEVIATHAN_GIT_TOKEN".to_string()),
            token_user: "x-access-token".to_string(),
            poll_interval: Duration::from_secs(15),
            min_interval: Duration::from_secs(MIN_INTERVAL_SECS),
        }
    }
}

pub struct Scheduler<C: Clock> {
    graph: Arc<Mutex<Graph>>,
    repo: Arc<dyn RepoAdapter>,
    host: Arc<dyn PrHost>,
    control: Arc<dyn ControlPlane>,
    launcher: Arc<dyn WorkerLauncher>,
    autonomy: AutonomySwitch,
    clock: C,
    config: SchedulerConfig,
    /// Targets with a tick in flight.
    leases: Mutex<HashSet<String>>,
    last_tick: Mutex<HashMap<String, Instant>>,
}

/// Releases the per-target lease when the tick ends, however it ends.
struct Lease<'a> {
    leases: &'a Mutex<HashSet<String>>,
    target: String,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.leases.lock().remove(&self.target);
    }
}

impl<C: Clock + 'static> Scheduler<C> {
    pub fn new(
        graph: Arc<Mutex<Graph>>,
        repo: Arc<dyn RepoAdapter>,
        host: Arc<dyn PrHost>,
        control: Arc<dyn ControlPlane>,
        launcher: Arc<dyn WorkerLauncher>,
        autonomy: AutonomySwitch,
        clock: C,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            graph,
            repo,
            host,
            control,
            launcher,
            autonomy,
            clock,
            config,
            leases: Mutex::new(HashSet::new()),
            last_tick: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate one target once. See the module docs for the check order.
    pub async fn tick(&self, target: &TargetNode) -> Result<TickOutcome, TickError> {
        let _lease = {
            let mut leases = self.leases.lock();
            if !leases.insert(target.id.clone()) {
                return Ok(TickOutcome::Overlapping);
            }
            Lease { leases: &self.leases, target: target.id.clone() }
        };

        // 1. Autonomy gate: the hot-read global switch and the target's
        //    own policy flag both have to be on.
        let (autonomy_enabled, autonomy_source) = {
            let reading = self.autonomy.read();
            (reading.enabled, reading.source.clone())
        };
        if !autonomy_enabled || !target.policy.autonomy_enabled {
            return self
                .skip(target, SkipReason::AutonomyDisabled, None, Some(autonomy_source))
                .await;
        }

        // 2. Circuit check.
        {
            let circuit_open = {
                let graph = self.graph.lock();
                graph.consecutive_failures(&target.id) >= target.policy.circuit_breaker_failures
            };
            if circuit_open {
                return self.skip(target, SkipReason::CircuitOpen, None, None).await;
            }
        }

        // 3. PR cap, against the remote (the journal may lag merges).
        let open_prs = match self.host.list_open_prs(&target.repo_url, AGENT_BRANCH_PREFIX).await
        {
            Ok(prs) => prs.len() as u32,
            Err(err) => {
                return self
                    .skip(target, SkipReason::FetchError, None, Some(format!("pr host: {err}")))
                    .await;
            }
        };
        if open_prs >= target.policy.max_open_prs {
            return self.skip(target, SkipReason::PrCap, None, None).await;
        }

        // 4. Running-attempt cap.
        if self.graph.lock().running_attempts(&target.id) >= target.policy.max_running_attempts {
            return self.skip(target, SkipReason::RunningCap, None, None).await;
        }

        // 5. Backlog (and policy) at the remote head.
        let locator = self.locator(target);
        let files = match self.repo.fetch_files(&locator, &[POLICY_PATH, BACKLOG_PATH]).await {
            Ok(files) => files,
            Err(err) => {
                return self
                    .skip(target, SkipReason::FetchError, None, Some(err.to_string()))
                    .await;
            }
        };

        let policy = match files.get(POLICY_PATH).and_then(|c| c.as_ref()) {
            Some(yaml) => match parse_policy(yaml) {
                Ok(policy) => policy,
                Err(err) => {
                    return self
                        .skip(
                            target,
                            SkipReason::FetchError,
                            None,
                            Some(format!("policy invalid: {err}")),
                        )
                        .await;
                }
            },
            // No policy at head: the registered snapshot governs.
            None => target.policy.clone(),
        };

        let backlog = match files.get(BACKLOG_PATH).and_then(|c| c.as_ref()) {
            Some(yaml) => match Backlog::from_yaml(yaml) {
                Ok(backlog) => backlog,
                Err(err) => {
                    return self
                        .skip(
                            target,
                            SkipReason::FetchError,
                            None,
                            Some(format!("backlog invalid: {err}")),
                        )
                        .await;
                }
            },
            None => {
                return self
                    .skip(
                        target,
                        SkipReason::FetchError,
                        None,
                        Some(format!("{BACKLOG_PATH} missing at {}", target.default_branch)),
                    )
                    .await;
            }
        };

        // 6. Task selection.
        let Some(task) = select_candidate(&backlog, &policy) else {
            return self.skip(target, SkipReason::NoCandidate, None, None).await;
        };

        // 7. Retry cap, counting running and terminal attempts but not
        //    invalidated ones.
        let (prior_attempts, attempt_number) = {
            let graph = self.graph.lock();
            (
                graph.attempts_for_task(&target.id, &task.id),
                graph.next_attempt_number(&target.id, &task.id),
            )
        };
        if prior_attempts >= policy.max_attempts_per_task {
            return self
                .skip(target, SkipReason::RetryCap, Some(task.id.clone()), None)
                .await;
        }

        // 8. Mint the attempt.
        let attempt_id = AttemptId::new();
        let mut events = Vec::new();
        if policy != target.policy {
            events.push(Event::now(
                &self.clock,
                ACTOR,
                EventKind::TargetUpdated {
                    target: target.id.clone(),
                    repo_url: None,
                    default_branch: None,
                    policy: Some(policy.clone()),
                },
            ));
        }
        events.push(Event::now(
            &self.clock,
            ACTOR,
            EventKind::AttemptCreated {
                attempt_id,
                task_id: task.id.clone(),
                attempt_number,
            },
        ));
        self.control.submit(&Bundle::new(target.id.clone(), events)).await?;

        // 9. Dispatch and return without waiting.
        let ctx = AttemptContext {
            target: target.id.clone(),
            repo_url: target.repo_url.clone(),
            base_branch: target.default_branch.clone(),
            task: task.clone(),
            attempt_id,
            attempt_number,
            policy,
            token_env: self.config.token_env.clone(),
            token_user: self.config.token_user.clone(),
            emit_created: false,
        };
        if let Err(err) = self.launcher.launch(ctx).await {
            warn!(target = %target.id, error = %err, "dispatch failed; invalidating minted attempt");
            let events = vec![
                Event::now(
                    &self.clock,
                    ACTOR,
                    EventKind::SchedulerSkipped {
                        reason: SkipReason::DispatchError,
                        task_id: Some(task.id.clone()),
                        detail: Some(err.to_string()),
                    },
                ),
                // The minted attempt must not count toward the retry cap.
                Event::now(
                    &self.clock,
                    ACTOR,
                    EventKind::AttemptInvalidated {
                        attempt_id,
                        reason: format!("dispatch failed: {err}"),
                    },
                ),
            ];
            self.control.submit(&Bundle::new(target.id.clone(), events)).await?;
            return Ok(TickOutcome::Skipped(SkipReason::DispatchError));
        }

        info!(
            target = %target.id,
            task = %task.id,
            attempt = %attempt_id,
            attempt_number,
            "dispatched"
        );
        Ok(TickOutcome::Dispatched { attempt_id, task_id: task.id.clone() })
    }

    /// Drive ticks until cancelled (the hard-stop layer suspends this
    /// loop; in-flight workers keep running).
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("scheduler tick source suspended");
                    return;
                }
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }

            let targets: Vec<TargetNode> =
                self.graph.lock().targets.values().cloned().collect();
            for target in targets {
                if !self.is_due(&target) {
                    continue;
                }
                let scheduler = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(err) = scheduler.tick(&target).await {
                        error!(target = %target.id, error = %err, "tick failed");
                    }
                });
            }
        }
    }

    fn is_due(&self, target: &TargetNode) -> bool {
        let interval = Duration::from_secs(target.policy.schedule_interval_seconds)
            .max(self.config.min_interval);
        let now = self.clock.now();
        let mut last = self.last_tick.lock();
        match last.get(&target.id) {
            Some(at) if now.duration_since(*at) < interval => false,
            _ => {
                last.insert(target.id.clone(), now);
                true
            }
        }
    }

    fn locator(&self, target: &TargetNode) -> RepoLocator {
        let auth = self
            .config
            .token_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty())
            .map(|token| lv_adapters::RepoAuth {
                username: self.config.token_user.clone(),
                token,
            });
        RepoLocator { url: target.repo_url.clone(), branch: target.default_branch.clone(), auth }
    }

    async fn skip(
        &self,
        target: &TargetNode,
        reason: SkipReason,
        task_id: Option<String>,
        detail: Option<String>,
    ) -> Result<TickOutcome, TickError> {
        info!(target = %target.id, ?reason, detail = detail.as_deref().unwrap_or(""), "tick skipped");
        let event = Event::now(
            &self.clock,
            ACTOR,
            EventKind::SchedulerSkipped { reason, task_id, detail },
        );
        self.control.submit(&Bundle::new(target.id.clone(), vec![event])).await?;
        Ok(TickOutcome::Skipped(reason))
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
