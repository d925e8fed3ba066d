// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projection queries.

use axum::extract::{Path, Query, State};
use axum::Json;
use lv_storage::{AttemptDetail, AttemptNode, GraphSummary};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub target: Option<String>,
    pub limit: Option<usize>,
}

pub async fn summary(State(state): State<AppState>) -> Json<GraphSummary> {
    Json(state.graph.lock().summary())
}

pub async fn attempts_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<AttemptNode>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    Json(state.graph.lock().attempts_for_target(params.target.as_deref(), limit))
}

pub async fn attempt_show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AttemptDetail>, ApiError> {
    state
        .graph
        .lock()
        .attempt(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("attempt {id}")))
}

pub async fn failures(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<AttemptNode>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    Json(state.graph.lock().recent_failures(params.target.as_deref(), limit))
}
