// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendering for command output.

use clap::ValueEnum;
use lv_storage::AttemptNode;
use serde::Serialize;

use crate::exit_error::{ExitError, EXIT_TRANSPORT};

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print raw JSON, or run the text renderer.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    value: &T,
    render: impl Fn(&T),
) -> Result<(), ExitError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|err| ExitError::new(EXIT_TRANSPORT, err.to_string()))?;
            println!("{json}");
        }
        OutputFormat::Text => render(value),
    }
    Ok(())
}

/// One attempt as a table row.
pub fn attempt_row(attempt: &AttemptNode) -> String {
    let status = attempt
        .status
        .map(|s| format!("{s:?}").to_lowercase())
        .unwrap_or_else(|| "running".to_string());
    let status = if attempt.invalidated { format!("{status} (invalidated)") } else { status };
    format!(
        "{:<24} {:<12} {:<20} #{:<3} {}",
        attempt.id, attempt.target, attempt.task_id, attempt.attempt_number, status
    )
}

pub fn attempt_header() -> String {
    format!(
        "{:<24} {:<12} {:<20} {:<4} {}",
        "ATTEMPT", "TARGET", "TASK", "N", "STATUS"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lv_core::AttemptStatus;

    fn node(status: Option<AttemptStatus>, invalidated: bool) -> AttemptNode {
        AttemptNode {
            id: "att-1".to_string(),
            target: "demo".to_string(),
            task_id: "fix-readme".to_string(),
            attempt_number: 2,
            created_seq: 1,
            created_at: chrono::DateTime::UNIX_EPOCH,
            started_at: None,
            completed_at: None,
            status,
            terminal_seq: None,
            failure_kind: None,
            error_summary: None,
            invalidated,
            invalidation_reason: None,
            pr_number: None,
            events: vec![],
        }
    }

    #[test]
    fn running_attempts_render_as_running() {
        let row = attempt_row(&node(None, false));
        assert!(row.contains("running"));
        assert!(row.contains("fix-readme"));
    }

    #[test]
    fn invalidated_attempts_are_marked() {
        let row = attempt_row(&node(Some(AttemptStatus::Failed), true));
        assert!(row.contains("failed (invalidated)"));
    }
}
