// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed artifact references.
//!
//! Artifacts are stored by reference, never inline in events. The blob
//! itself lives in the artifact store; events and bundles carry only this
//! reference.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    /// Hex SHA-256 of the content; the identity of the blob.
    pub sha256: String,
    /// What the blob is, e.g. `worker-log`, `crash-report`.
    pub kind: String,
    /// Storage URI the blob can be fetched from.
    pub uri: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}
