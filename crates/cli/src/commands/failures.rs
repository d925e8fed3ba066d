// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lv failures-recent`

use lv_storage::AttemptNode;

use crate::client::ApiClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

pub async fn run(
    client: &ApiClient,
    target: Option<&str>,
    limit: usize,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let mut path = format!("/v1/failures?limit={limit}");
    if let Some(target) = target {
        path.push_str(&format!("&target={target}"));
    }
    let failures: Vec<AttemptNode> = client.get(&path).await?;
    format_or_json(format, &failures, |failures| {
        if failures.is_empty() {
            println!("no recent failures");
            return;
        }
        for attempt in failures {
            let kind = attempt
                .failure_kind
                .map(|k| k.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "{:<24} {:<12} {:<20} {:<18} {}",
                attempt.id,
                attempt.target,
                attempt.task_id,
                kind,
                attempt.error_summary.as_deref().unwrap_or(""),
            );
        }
    })
}
