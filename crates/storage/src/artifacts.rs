// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content-addressed artifact store.
//!
//! Blobs are keyed by hex SHA-256 and sharded by the first two hex chars
//! (`artifacts/ab/abcd…`). Writes go through a temp file and rename so a
//! crash never leaves a half-written blob under its final name.

use std::fs;
use std::path::PathBuf;

use lv_core::{sha256_hex, ArtifactRef};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("artifact I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid artifact hash: {0:?}")]
    InvalidHash(String),
}

pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArtifactStoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Store a blob, returning its reference. Storing the same bytes
    /// twice is a no-op returning the same reference.
    pub fn put(
        &self,
        bytes: &[u8],
        kind: &str,
        mime_type: Option<&str>,
    ) -> Result<ArtifactRef, ArtifactStoreError> {
        let sha = sha256_hex(bytes);
        let path = self.blob_path(&sha)?;
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let tmp = path.with_extension("tmp");
            fs::write(&tmp, bytes)?;
            fs::rename(&tmp, &path)?;
        }
        Ok(ArtifactRef {
            sha256: sha.clone(),
            kind: kind.to_string(),
            uri: format!("artifacts/{}/{}", &sha[..2], sha),
            size: bytes.len() as u64,
            mime_type: mime_type.map(|m| m.to_string()),
        })
    }

    pub fn get(&self, sha256: &str) -> Result<Option<Vec<u8>>, ArtifactStoreError> {
        let path = self.blob_path(sha256)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn contains(&self, sha256: &str) -> bool {
        self.blob_path(sha256).map(|p| p.exists()).unwrap_or(false)
    }

    fn blob_path(&self, sha256: &str) -> Result<PathBuf, ArtifactStoreError> {
        if sha256.len() != 64 || !sha256.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ArtifactStoreError::InvalidHash(sha256.to_string()));
        }
        Ok(self.root.join(&sha256[..2]).join(sha256))
    }
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;
