// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /v1/events/ingest`: atomic bundle append.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lv_core::Bundle;
use lv_storage::AppendReceipt;

use crate::error::ApiError;
use crate::ingest::append_bundle;
use crate::state::AppState;

pub async fn ingest(
    State(state): State<AppState>,
    Json(bundle): Json<Bundle>,
) -> Result<(StatusCode, Json<AppendReceipt>), ApiError> {
    let receipt = append_bundle(&state, &bundle)?;
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}
