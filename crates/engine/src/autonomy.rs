// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The kill-switch reading of configuration.
//!
//! The autonomy flag is read from its file mount on every consult; the
//! scheduler gate and the status endpoint must see an operator edit at
//! the very next tick or request, so nothing here caches beyond
//! last-known-good fallback for an unreadable mount.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

/// One hot read: the effective flag and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutonomyReading {
    pub enabled: bool,
    /// `file:<path>`, `lastKnownGood`, or `default(configMissing)`.
    pub source: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AutonomyFile {
    autonomy_enabled: bool,
}

/// Hot-read autonomy switch with last-known-good fallback.
///
/// The fallback default is `enabled = true` for backwards compatibility
/// with deployments that predate the switch; operators must mount the
/// file to get a working kill switch.
#[derive(Clone)]
pub struct AutonomySwitch {
    path: Option<PathBuf>,
    last_known_good: Arc<Mutex<Option<bool>>>,
}

impl AutonomySwitch {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path, last_known_good: Arc::new(Mutex::new(None)) }
    }

    /// No file configured at all; always-on with the missing-config source.
    pub fn unconfigured() -> Self {
        Self::new(None)
    }

    pub fn read(&self) -> AutonomyReading {
        let Some(path) = &self.path else {
            return AutonomyReading {
                enabled: true,
                source: "default(configMissing)".to_string(),
            };
        };

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<AutonomyFile>(&content) {
                Ok(file) => {
                    *self.last_known_good.lock() = Some(file.autonomy_enabled);
                    AutonomyReading {
                        enabled: file.autonomy_enabled,
                        source: format!("file:{}", path.display()),
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "autonomy file unparsable");
                    self.fallback()
                }
            },
            Err(_) => self.fallback(),
        }
    }

    fn fallback(&self) -> AutonomyReading {
        match *self.last_known_good.lock() {
            Some(enabled) => {
                AutonomyReading { enabled, source: "lastKnownGood".to_string() }
            }
            None => AutonomyReading {
                enabled: true,
                source: "default(configMissing)".to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "autonomy_tests.rs"]
mod tests;
