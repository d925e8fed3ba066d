// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lv-server: the control-plane API.
//!
//! One process owns the journal and the projection. Ingestion appends a
//! bundle atomically and folds the new entries into the graph while the
//! journal lock is held, so the single-writer projection contract falls
//! out of the lock order (journal, then graph) rather than a dedicated
//! thread.

pub mod auth;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod state;

pub use ingest::{append_bundle, LocalControlPlane};
pub use routes::build_router;
pub use state::AppState;
