// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! API error responses.
//!
//! Status mapping: 400 validation, 401 auth, 404 unknown id, 409
//! duplicate or chain conflict, 500 internal, 503 integrity alarm.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lv_storage::JournalError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("missing or invalid bearer token")]
    Auth,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("integrity alarm raised; ingestion refused")]
    IntegrityAlarm,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<JournalError> for ApiError {
    fn from(err: JournalError) -> Self {
        if err.is_conflict() {
            ApiError::Conflict(err.to_string())
        } else if err.is_retryable() {
            ApiError::Internal(err.to_string())
        } else {
            ApiError::Validation(err.to_string())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::IntegrityAlarm => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
