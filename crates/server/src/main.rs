// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! lvd: the Leviathan control-plane daemon.
//!
//! Owns the journal and projection, serves the HTTP API, and (with
//! `--schedule`) runs the closed scheduling loop in the same process.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use lv_adapters::{GitCli, GitHubHost};
use lv_core::SystemClock;
use lv_engine::{AutonomySwitch, LocalLauncher, Scheduler, SchedulerConfig, Worker};
use lv_server::{build_router, AppState, LocalControlPlane};
use lv_storage::{
    load_snapshot, write_snapshot, ArtifactStore, ChainVerdict, Graph, Journal, RangeFilter,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lvd", about = "Leviathan control-plane daemon")]
struct Args {
    /// Address to serve the API on.
    #[arg(long, default_value = "127.0.0.1:7700")]
    listen: SocketAddr,

    /// Directory holding the journal, projection snapshot, and scratch.
    #[arg(long, default_value = "leviathan-state")]
    state_dir: PathBuf,

    /// Autonomy configuration file (hot-read kill switch).
    #[arg(long)]
    autonomy_file: Option<PathBuf>,

    /// Discard the snapshot and replay the journal from sequence 0.
    #[arg(long)]
    rebuild_on_start: bool,

    /// Bearer token for every endpoint except /healthz.
    #[arg(long, env = "LEVIATHAN_CONTROL_PLANE_TOKEN")]
    token: Option<String>,

    /// Run the scheduler loop in this process.
    #[arg(long)]
    schedule: bool,

    /// Environment variable naming the git/PR-host token.
    #[arg(long, default_value = "LEVIATHAN_GIT_TOKEN")]
    git_token_env: String,

    /// External task-editor program (required with --schedule). Invoked
    /// in the clone with the task as JSON on stdin; prints modified
    /// paths on stdout.
    #[arg(long)]
    editor_cmd: Option<String>,

    /// PR host API base URL.
    #[arg(long, default_value = "https://api.github.com")]
    pr_host_api: String,

    /// Directory for log files; stderr when unset.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn init_tracing(log_dir: Option<&PathBuf>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "lvd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_ref());

    if let Err(err) = run(args).await {
        error!("lvd failed: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let journal_dir = args.state_dir.join("journal");
    let snapshot_path = args.state_dir.join("graph.snap");

    let journal = Journal::open(&journal_dir)?;

    // Verify the chain before serving anything; a divergence raises the
    // integrity alarm and refuses ingestion until acknowledged.
    let verdict = journal.verify_chain(0, None)?;

    // Projection: resume from snapshot when it agrees with the journal.
    let (tip_seq, _) = journal.tip();
    let mut graph = if args.rebuild_on_start {
        info!("rebuild-on-start: replaying journal from sequence 0");
        Graph::default()
    } else {
        match load_snapshot(&snapshot_path) {
            Some(snapshot) if snapshot.last_applied_seq <= tip_seq => {
                info!(resume_from = snapshot.last_applied_seq, "projection resumed from snapshot");
                snapshot
            }
            Some(_) => {
                warn!("snapshot is ahead of the journal; rebuilding");
                Graph::default()
            }
            None => Graph::default(),
        }
    };
    let tail = journal.range(graph.last_applied_seq, None, &RangeFilter::default())?;
    graph.apply_all(&tail);
    info!(tip_seq, targets = graph.targets.len(), attempts = graph.attempts.len(), "projection ready");

    let autonomy = AutonomySwitch::new(args.autonomy_file.clone());
    let artifacts = ArtifactStore::open(args.state_dir.join("artifacts"))?;
    let mut state = AppState::new(journal, graph)
        .with_autonomy(autonomy.clone())
        .with_artifacts(artifacts)
        .with_snapshot_path(snapshot_path.clone());
    if let Some(token) = &args.token {
        state = state.with_auth_token(token.clone());
    } else {
        warn!("no control-plane token configured; API is open");
    }

    if let ChainVerdict::Divergent { seq, detail } = verdict {
        error!(seq, detail, "journal chain divergent; raising integrity alarm");
        state.raise_alarm();
    }

    let shutdown = CancellationToken::new();

    // Optional in-process scheduling loop (the closed loop shares the
    // projection and appends through the same ingestion path).
    if args.schedule {
        let scratch = args.state_dir.join("scratch");
        let control = Arc::new(LocalControlPlane::new(state.clone()));
        let git = Arc::new(GitCli::new(scratch.clone()));
        let host_token = std::env::var(&args.git_token_env).unwrap_or_default();
        let host = Arc::new(GitHubHost::new(args.pr_host_api.clone(), host_token));
        // The editor itself is an external collaborator; only its
        // command-line contract is wired here.
        let editor_cmd = args
            .editor_cmd
            .as_ref()
            .ok_or("--schedule requires --editor-cmd")?;
        let editor = Arc::new(lv_adapters::CommandEditor::new(editor_cmd.clone()));
        let worker = Arc::new(Worker::new(
            Arc::clone(&git) as _,
            Arc::clone(&host) as _,
            Arc::clone(&control) as _,
            editor,
            SystemClock,
            scratch,
        ));
        let launcher = Arc::new(LocalLauncher::new(worker));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&state.graph),
            git,
            host,
            control,
            launcher,
            autonomy,
            SystemClock,
            SchedulerConfig {
                token_env: Some(args.git_token_env.clone()),
                ..SchedulerConfig::default()
            },
        ));
        tokio::spawn(scheduler.run(shutdown.clone()));
        info!("scheduler loop running");
    }

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(listen = %args.listen, "lvd serving");

    let router = build_router(state.clone());
    let graceful = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
            graceful.cancel();
        })
        .await?;

    // Persist the projection so the next start replays only the tail.
    let graph = state.graph.lock().clone();
    if let Err(err) = write_snapshot(&snapshot_path, &graph) {
        warn!(error = %err, "projection snapshot not written");
    }
    Ok(())
}
