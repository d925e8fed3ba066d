// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lv invalidate <attempt> --reason …`

use lv_storage::AppendReceipt;

use crate::client::ApiClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

pub async fn run(
    client: &ApiClient,
    attempt: &str,
    reason: &str,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let body = serde_json::json!({ "reason": reason });
    let receipt: AppendReceipt =
        client.post(&format!("/v1/attempts/{attempt}/invalidate"), &body).await?;
    format_or_json(format, &receipt, |receipt| {
        println!("attempt {attempt} invalidated (journal seq {})", receipt.last_seq);
    })
}
