// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane ingestion client.
//!
//! Workers and the scheduler submit event bundles here. The client is
//! deliberately single-shot: retry policy (full-jitter backoff inside a
//! total elapsed-time budget) belongs to the submitting component, which
//! knows its own deadline.

use async_trait::async_trait;
use lv_core::Bundle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control plane transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("control plane rejected the token")]
    Auth,
    #[error("control plane rate limit exceeded")]
    RateLimited,
    #[error("duplicate event id in bundle")]
    Conflict,
    #[error("control plane is in integrity alarm")]
    Alarm,
    #[error("bundle failed validation: {0}")]
    Validation(String),
    #[error("control plane error {status}: {message}")]
    Api { status: u16, message: String },
}

impl ControlError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ControlError::Transport(_) | ControlError::RateLimited)
    }
}

/// Sequence range and chain tip assigned to an accepted bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub first_seq: u64,
    pub last_seq: u64,
    pub tip_hash: String,
}

#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn submit(&self, bundle: &Bundle) -> Result<IngestReceipt, ControlError>;
}

/// HTTP client for `POST /v1/events/ingest`.
pub struct HttpControlPlane {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpControlPlane {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn submit(&self, bundle: &Bundle) -> Result<IngestReceipt, ControlError> {
        let url = format!("{}/v1/events/ingest", self.base_url.trim_end_matches('/'));
        let response =
            self.http.post(url).bearer_auth(&self.token).json(bundle).send().await?;
        let status = response.status().as_u16();
        match status {
            200 | 202 => Ok(response.json().await?),
            400 => Err(ControlError::Validation(response.text().await.unwrap_or_default())),
            401 => Err(ControlError::Auth),
            409 => Err(ControlError::Conflict),
            429 => Err(ControlError::RateLimited),
            503 => Err(ControlError::Alarm),
            _ => Err(ControlError::Api {
                status,
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}
