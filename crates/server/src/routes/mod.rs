// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface.
//!
//! All JSON in and out, bearer auth on everything except the liveness
//! probe.

mod admin;
mod artifacts;
mod autonomy;
mod events;
mod graph;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::require_bearer;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let authed = Router::new()
        .route("/v1/events/ingest", post(events::ingest))
        .route("/v1/graph/summary", get(graph::summary))
        .route("/v1/attempts", get(graph::attempts_list))
        .route("/v1/attempts/:id", get(graph::attempt_show))
        .route("/v1/attempts/:id/invalidate", post(admin::invalidate))
        .route("/v1/failures", get(graph::failures))
        .route("/v1/artifacts/:sha256", get(artifacts::get))
        .route("/v1/autonomy/status", get(autonomy::status))
        .route("/v1/integrity/ack", post(admin::integrity_ack))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .merge(authed)
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Unauthenticated liveness probe.
async fn healthz() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
#[path = "../routes_tests.rs"]
mod tests;
