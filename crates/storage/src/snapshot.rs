// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Projection snapshots.
//!
//! The graph is a cache; snapshots only save replay time on startup. A
//! snapshot that cannot be read or that disagrees with the journal is
//! discarded and the graph rebuilt from sequence 0.

use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::graph::Graph;

/// zstd level for snapshot compression; snapshots are write-rarely.
const COMPRESSION_LEVEL: i32 = 3;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot not serializable: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persist the graph (with its `last_applied_seq`) as compressed JSON.
pub fn write_snapshot(path: &Path, graph: &Graph) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec(graph)?;
    let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?;
    let tmp = path.with_extension("snap.tmp");
    fs::write(&tmp, compressed)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a snapshot if present and decodable; `None` means rebuild.
pub fn load_snapshot(path: &Path) -> Option<Graph> {
    let compressed = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return None,
    };
    let json = match zstd::decode_all(compressed.as_slice()) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "discarding undecodable snapshot");
            return None;
        }
    };
    match serde_json::from_slice(&json) {
        Ok(graph) => Some(graph),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "discarding unparsable snapshot");
            None
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
