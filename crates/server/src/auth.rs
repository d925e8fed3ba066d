// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token authentication.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Constant-time byte comparison; runs over the presented token's full
/// length regardless of where the first mismatch is.
fn token_eq(expected: &str, presented: &str) -> bool {
    let a = expected.as_bytes();
    let b = presented.as_bytes();
    let mut diff = a.len() ^ b.len();
    for i in 0..b.len() {
        let x = a.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ b[i]);
    }
    diff == 0
}

/// Middleware for everything except `/healthz`.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = &state.auth_token else {
        // No token configured: open server (development mode).
        return Ok(next.run(request).await);
    };

    let presented = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if token_eq(expected, token) => Ok(next.run(request).await),
        _ => Err(ApiError::Auth),
    }
}
