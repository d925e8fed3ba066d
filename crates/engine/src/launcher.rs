// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker dispatch seam.
//!
//! The scheduler only needs "start this attempt and come back
//! immediately". The local launcher runs workers as tokio tasks in the
//! daemon process; a process-per-attempt launcher can implement the same
//! trait without the scheduler noticing.

use std::sync::Arc;

use async_trait::async_trait;
use lv_core::Clock;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::context::AttemptContext;
use crate::worker::Worker;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("worker could not be launched: {0}")]
    Spawn(String),
}

#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Accept the dispatch. Returns as soon as the worker is running;
    /// completion is observed through the journal, never awaited here.
    async fn launch(&self, ctx: AttemptContext) -> Result<(), LaunchError>;
}

/// Runs workers as tasks inside the daemon process.
pub struct LocalLauncher<C: Clock + 'static> {
    worker: Arc<Worker<C>>,
    /// Forcible-termination signal; graceful shutdown leaves workers
    /// running to completion.
    kill: CancellationToken,
}

impl<C: Clock + 'static> LocalLauncher<C> {
    pub fn new(worker: Arc<Worker<C>>) -> Self {
        Self { worker, kill: CancellationToken::new() }
    }

    /// Token that force-cancels every in-flight worker when cancelled.
    pub fn kill_token(&self) -> CancellationToken {
        self.kill.clone()
    }
}

#[async_trait]
impl<C: Clock + 'static> WorkerLauncher for LocalLauncher<C> {
    async fn launch(&self, ctx: AttemptContext) -> Result<(), LaunchError> {
        let worker = Arc::clone(&self.worker);
        let cancel = self.kill.child_token();
        info!(attempt = %ctx.attempt_id, task = %ctx.task.id, target = %ctx.target, "dispatching worker");
        tokio::spawn(async move {
            let outcome = worker.run(ctx, cancel).await;
            tracing::debug!(?outcome, "worker exited");
        });
        Ok(())
    }
}
