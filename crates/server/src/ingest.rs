// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bundle ingestion: append to the journal, fold into the graph.
//!
//! Used by the HTTP route and, in-process, by the scheduler and workers
//! of a combined daemon via [`LocalControlPlane`]: same code path, no
//! loopback HTTP.

use async_trait::async_trait;
use lv_adapters::{ControlError, ControlPlane, IngestReceipt};
use lv_core::Bundle;
use lv_storage::{AppendReceipt, RangeFilter};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Append a bundle and project the new entries. Lock order: journal,
/// then graph, both released before returning.
pub fn append_bundle(state: &AppState, bundle: &Bundle) -> Result<AppendReceipt, ApiError> {
    if state.alarm_raised() {
        return Err(ApiError::IntegrityAlarm);
    }

    let mut journal = state.journal.lock();
    let receipt = journal.append(bundle)?;
    let entries = journal
        .range(receipt.first_seq - 1, Some(receipt.last_seq), &RangeFilter::default())
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    {
        let mut graph = state.graph.lock();
        graph.apply_all(&entries);
    }
    drop(journal);

    info!(
        target = %bundle.target,
        events = bundle.events.len(),
        first_seq = receipt.first_seq,
        last_seq = receipt.last_seq,
        "bundle ingested"
    );
    Ok(receipt)
}

/// In-process [`ControlPlane`] for the combined daemon.
#[derive(Clone)]
pub struct LocalControlPlane {
    state: AppState,
}

impl LocalControlPlane {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ControlPlane for LocalControlPlane {
    async fn submit(&self, bundle: &Bundle) -> Result<IngestReceipt, ControlError> {
        match append_bundle(&self.state, bundle) {
            Ok(receipt) => Ok(IngestReceipt {
                first_seq: receipt.first_seq,
                last_seq: receipt.last_seq,
                tip_hash: receipt.tip_hash,
            }),
            Err(ApiError::Conflict(_)) => Err(ControlError::Conflict),
            Err(ApiError::IntegrityAlarm) => Err(ControlError::Alarm),
            Err(ApiError::Validation(message)) => Err(ControlError::Validation(message)),
            Err(err) => Err(ControlError::Api { status: 500, message: err.to_string() }),
        }
    }
}
