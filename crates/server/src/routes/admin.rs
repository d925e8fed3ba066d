// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator actions: attempt invalidation, integrity acknowledgment.
//!
//! Administrative writes go through the journal as events, never as
//! direct projection mutation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use lv_core::{Bundle, Clock, Event, EventKind};
use lv_storage::{AppendReceipt, ChainVerdict};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::ingest::append_bundle;
use crate::state::AppState;

const OPERATOR_ACTOR: &str = "operator";

#[derive(Debug, Deserialize)]
pub struct InvalidateBody {
    pub reason: String,
}

pub async fn invalidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<InvalidateBody>,
) -> Result<Json<AppendReceipt>, ApiError> {
    if body.reason.trim().is_empty() {
        return Err(ApiError::Validation("reason must be non-empty".to_string()));
    }

    // Resolve by id or unique prefix; invalidation of an invalidated
    // attempt still appends its no-op event.
    let (attempt_id, target) = {
        let graph = state.graph.lock();
        let detail = graph
            .attempt(&id)
            .ok_or_else(|| ApiError::NotFound(format!("attempt {id}")))?;
        (detail.attempt.id.clone(), detail.attempt.target.clone())
    };

    let event = Event::now(
        &state.clock,
        OPERATOR_ACTOR,
        EventKind::AttemptInvalidated {
            attempt_id: lv_core::AttemptId::from_string(&attempt_id),
            reason: body.reason,
        },
    );
    let receipt = append_bundle(&state, &Bundle::new(target, vec![event]))?;
    Ok(Json(receipt))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    pub cleared: bool,
    pub checked: u64,
}

/// Clear the integrity alarm, only after the chain verifies clean.
pub async fn integrity_ack(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AckResponse>), ApiError> {
    let verdict = {
        let journal = state.journal.lock();
        journal.verify_chain(0, None).map_err(|err| ApiError::Internal(err.to_string()))?
    };
    match verdict {
        ChainVerdict::Valid { checked } => {
            state.clear_alarm();
            Ok((StatusCode::OK, Json(AckResponse { cleared: true, checked })))
        }
        ChainVerdict::Divergent { seq, detail } => Err(ApiError::Conflict(format!(
            "chain still divergent at seq {seq}: {detail}"
        ))),
    }
}
