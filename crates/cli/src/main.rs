// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lv: operator CLI for the Leviathan control plane.

mod client;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};

use client::ApiClient;
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "lv", about = "Operator CLI for the Leviathan control plane", version)]
struct Cli {
    /// Control-plane base URL.
    #[arg(long, env = "LEVIATHAN_API_URL", default_value = "http://127.0.0.1:7700")]
    api_url: String,

    /// Bearer token.
    #[arg(long, env = "LEVIATHAN_CONTROL_PLANE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Node and edge counts plus recent events
    GraphSummary,
    /// List attempts, newest first
    AttemptsList {
        /// Filter by target id
        #[arg(long)]
        target: Option<String>,
        /// Maximum number of attempts to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Show one attempt with its events and artifacts
    AttemptsShow {
        /// Attempt ID or unique prefix
        id: String,
    },
    /// Recent failed or timed-out attempts
    FailuresRecent {
        /// Filter by target id
        #[arg(long)]
        target: Option<String>,
        /// Maximum number of failures to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
    /// Remove an attempt from retry-cap and circuit counting
    Invalidate {
        /// Attempt ID or unique prefix
        attempt: String,
        /// Why the attempt should not count
        #[arg(long)]
        reason: String,
    },
}

async fn dispatch(cli: Cli) -> Result<(), ExitError> {
    let client = ApiClient::new(cli.api_url.clone(), cli.token.clone());
    match &cli.command {
        Command::GraphSummary => commands::graph::run(&client, cli.format).await,
        Command::AttemptsList { target, limit } => {
            commands::attempts::list(&client, target.as_deref(), *limit, cli.format).await
        }
        Command::AttemptsShow { id } => commands::attempts::show(&client, id, cli.format).await,
        Command::FailuresRecent { target, limit } => {
            commands::failures::run(&client, target.as_deref(), *limit, cli.format).await
        }
        Command::Invalidate { attempt, reason } => {
            commands::invalidate::run(&client, attempt, reason, cli.format).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = dispatch(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.code);
    }
}
