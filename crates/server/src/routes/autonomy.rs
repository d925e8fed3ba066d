// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /v1/autonomy/status`: per-request hot read, never cached.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutonomyStatus {
    pub autonomy_enabled: bool,
    pub source: String,
}

pub async fn status(State(state): State<AppState>) -> Json<AutonomyStatus> {
    let reading = state.autonomy.read();
    Json(AutonomyStatus { autonomy_enabled: reading.enabled, source: reading.source })
}
