// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared server context for all request handlers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lv_core::SystemClock;
use lv_engine::AutonomySwitch;
use lv_storage::{ArtifactStore, Graph, Journal};
use parking_lot::Mutex;

/// Handler context. Lock order is always journal before graph; no lock
/// is held across an await.
#[derive(Clone)]
pub struct AppState {
    pub journal: Arc<Mutex<Journal>>,
    pub graph: Arc<Mutex<Graph>>,
    /// Content-addressed blob store for attempt diagnostics.
    pub artifacts: Option<Arc<ArtifactStore>>,
    /// Raised on chain divergence; refuses ingestion until acknowledged.
    pub alarm: Arc<AtomicBool>,
    /// Bearer token; `None` disables auth (development only).
    pub auth_token: Option<Arc<String>>,
    pub autonomy: AutonomySwitch,
    /// Projection snapshot location, written on shutdown.
    pub snapshot_path: Option<PathBuf>,
    pub clock: SystemClock,
}

impl AppState {
    pub fn new(journal: Journal, graph: Graph) -> Self {
        Self {
            journal: Arc::new(Mutex::new(journal)),
            graph: Arc::new(Mutex::new(graph)),
            artifacts: None,
            alarm: Arc::new(AtomicBool::new(false)),
            auth_token: None,
            autonomy: AutonomySwitch::unconfigured(),
            snapshot_path: None,
            clock: SystemClock,
        }
    }

    pub fn with_artifacts(mut self, store: ArtifactStore) -> Self {
        self.artifacts = Some(Arc::new(store));
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(Arc::new(token.into()));
        self
    }

    pub fn with_autonomy(mut self, autonomy: AutonomySwitch) -> Self {
        self.autonomy = autonomy;
        self
    }

    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    pub fn alarm_raised(&self) -> bool {
        self.alarm.load(Ordering::SeqCst)
    }

    pub fn raise_alarm(&self) {
        self.alarm.store(true, Ordering::SeqCst);
    }

    pub fn clear_alarm(&self) {
        self.alarm.store(false, Ordering::SeqCst);
    }
}
