// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lv attempts-list` and `lv attempts-show`

use lv_storage::{AttemptDetail, AttemptNode};

use crate::client::ApiClient;
use crate::exit_error::ExitError;
use crate::output::{attempt_header, attempt_row, format_or_json, OutputFormat};

pub async fn list(
    client: &ApiClient,
    target: Option<&str>,
    limit: usize,
    format: OutputFormat,
) -> Result<(), ExitError> {
    let mut path = format!("/v1/attempts?limit={limit}");
    if let Some(target) = target {
        path.push_str(&format!("&target={target}"));
    }
    let attempts: Vec<AttemptNode> = client.get(&path).await?;
    format_or_json(format, &attempts, |attempts| {
        if attempts.is_empty() {
            println!("no attempts");
            return;
        }
        println!("{}", attempt_header());
        for attempt in attempts {
            println!("{}", attempt_row(attempt));
        }
    })
}

pub async fn show(client: &ApiClient, id: &str, format: OutputFormat) -> Result<(), ExitError> {
    let detail: AttemptDetail = client.get(&format!("/v1/attempts/{id}")).await?;
    format_or_json(format, &detail, |detail| {
        let attempt = &detail.attempt;
        println!("attempt:   {}", attempt.id);
        println!("target:    {}", attempt.target);
        println!("task:      {} (attempt #{})", attempt.task_id, attempt.attempt_number);
        match attempt.status {
            Some(status) => println!("status:    {status:?}"),
            None => println!("status:    running"),
        }
        if attempt.invalidated {
            println!(
                "invalid:   yes ({})",
                attempt.invalidation_reason.as_deref().unwrap_or("no reason recorded")
            );
        }
        if let Some(kind) = attempt.failure_kind {
            println!("failure:   {kind}");
        }
        if let Some(summary) = &attempt.error_summary {
            println!("error:     {summary}");
        }
        if let Some(number) = attempt.pr_number {
            println!("pr:        #{number}");
        }
        println!("created:   {}", attempt.created_at);
        if let Some(at) = attempt.completed_at {
            println!("completed: {at}");
        }
        if !detail.events.is_empty() {
            println!();
            println!("events:");
            for event in &detail.events {
                println!("  {:>6}  {:<22} {}", event.seq, event.event_type, event.timestamp);
            }
        }
        if !detail.artifacts.is_empty() {
            println!();
            println!("artifacts:");
            for artifact in &detail.artifacts {
                println!("  {}  {} ({} bytes)", &artifact.sha256[..12], artifact.kind, artifact.size);
            }
        }
    })
}
