// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable error taxonomy shared across components.
//!
//! These are classification kinds, not concrete error types. Each crate
//! defines its own `thiserror` enums and maps them onto a kind where the
//! propagation policy needs one (retry decisions, HTTP status codes,
//! terminal failure classification).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthFailed,
    TransportFailed,
    ValidationFailed,
    PolicyViolation,
    ScopeViolation,
    IntegrityAlarm,
    RateLimited,
    Timeout,
    NotFound,
    Conflict,
    InternalError,
}

impl ErrorKind {
    /// Kinds the caller may retry with backoff. Everything else is
    /// terminal for the operation that hit it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::TransportFailed | ErrorKind::RateLimited)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::AuthFailed => "AuthFailed",
            ErrorKind::TransportFailed => "TransportFailed",
            ErrorKind::ValidationFailed => "ValidationFailed",
            ErrorKind::PolicyViolation => "PolicyViolation",
            ErrorKind::ScopeViolation => "ScopeViolation",
            ErrorKind::IntegrityAlarm => "IntegrityAlarm",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::InternalError => "InternalError",
        };
        f.write_str(s)
    }
}
