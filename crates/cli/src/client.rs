// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for the control-plane API.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::exit_error::{
    ExitError, EXIT_AUTH, EXIT_NOT_FOUND, EXIT_TRANSPORT, EXIT_VALIDATION,
};

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Exit code for an HTTP status the server returned.
pub(crate) fn exit_code_for(status: u16) -> i32 {
    match status {
        400 | 409 => EXIT_VALIDATION,
        401 | 403 => EXIT_AUTH,
        404 => EXIT_NOT_FOUND,
        _ => EXIT_TRANSPORT,
    }
}

impl ApiClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url, token }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExitError> {
        let request = self.http.get(self.url(path));
        self.send(request).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ExitError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> Result<T, ExitError> {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(|err| {
            ExitError::new(EXIT_TRANSPORT, format!("control plane unreachable: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| status.to_string());
            return Err(ExitError::new(exit_code_for(status.as_u16()), detail));
        }
        response.json::<T>().await.map_err(|err| {
            ExitError::new(EXIT_TRANSPORT, format!("malformed response: {err}"))
        })
    }
}
