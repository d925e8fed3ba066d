// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lv graph-summary`

use lv_storage::GraphSummary;

use crate::client::ApiClient;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

pub async fn run(client: &ApiClient, format: OutputFormat) -> Result<(), ExitError> {
    let summary: GraphSummary = client.get("/v1/graph/summary").await?;
    format_or_json(format, &summary, |s| {
        println!("targets:        {}", s.targets);
        println!("tasks:          {}", s.tasks);
        println!("attempts:       {} ({} running)", s.attempts, s.running_attempts);
        println!("pull requests:  {} ({} open)", s.pull_requests, s.open_pull_requests);
        println!("artifacts:      {}", s.artifacts);
        println!("edges:          {}", s.edges);
        println!("journal seq:    {}", s.last_applied_seq);
        if !s.recent.is_empty() {
            println!();
            println!("recent events:");
            for header in s.recent.iter().take(10) {
                println!(
                    "  {:>6}  {:<22} {:<12} {}",
                    header.seq, header.event_type, header.target, header.timestamp
                );
            }
        }
    })
}
