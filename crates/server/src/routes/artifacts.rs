// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact blob retrieval.
//!
//! Events carry artifacts by reference only; this is where the blob
//! behind a reference is fetched.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    Path(sha256): Path<String>,
) -> Result<Response, ApiError> {
    let Some(store) = &state.artifacts else {
        return Err(ApiError::NotFound("artifact store not configured".to_string()));
    };

    let bytes = store
        .get(&sha256)
        .map_err(|err| ApiError::Validation(err.to_string()))?
        .ok_or_else(|| ApiError::NotFound(format!("artifact {sha256}")))?;

    let mime = state
        .graph
        .lock()
        .artifacts
        .get(&sha256)
        .and_then(|a| a.mime_type.clone())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}
