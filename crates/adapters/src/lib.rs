// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lv-adapters: outbound seams of the control plane and worker.
//!
//! Everything that touches the outside world (the git binary, the PR
//! host API, the control-plane ingestion endpoint, the task editor)
//! lives behind an async trait here, with scripted fakes available under
//! the `test-support` feature.

pub mod control;
pub mod editor;
pub mod host;
pub mod repo;
pub mod retry;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use control::{ControlError, ControlPlane, HttpControlPlane, IngestReceipt};
pub use editor::{CommandEditor, EditorError, TaskEditor};
pub use host::{CreatePr, GitHubHost, HostError, PrHost};
pub use repo::{GitCli, RepoAdapter, RepoAuth, RepoError, RepoLocator};
pub use retry::{retry, BackoffConfig};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeControlPlane, FakeEditor, FakeHost, FakeRepo};
