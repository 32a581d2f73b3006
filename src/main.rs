//! CLI entry point for the batchfetch binary.
//!
//! Owns the process-level concerns the core library stays out of: logging
//! setup, signal wiring, config loading, and exit-code mapping. Exit codes:
//! 0 for a clean batch, 1 for startup or batch failure, 2 for cancellation.

use std::process::ExitCode;

use anyhow::Result;
use batchfetch_core::{BatchError, BatchRunner, BatchSummary, Config, HttpClient};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

mod cli;

use cli::Args;

/// Exit code for a batch interrupted by cancellation, distinct from failure.
const EXIT_CANCELLED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    match run(&args, cancel).await {
        Ok(summary) => {
            info!(
                succeeded = summary.succeeded,
                total = summary.total,
                elapsed_ms = summary.elapsed.as_millis(),
                "finished downloads"
            );
            ExitCode::SUCCESS
        }
        Err(e) if matches!(e.downcast_ref::<BatchError>(), Some(BatchError::Cancelled)) => {
            warn!("operation cancelled");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            error!(error = %e, "failed to run downloads");
            ExitCode::FAILURE
        }
    }
}

/// Loads the config and drives the batch to completion.
async fn run(args: &Args, cancel: CancellationToken) -> Result<BatchSummary> {
    let config = Config::load_from_file(&args.config)?;

    info!(
        output_path = %config.output_path,
        max_concurrent = config.max_concurrent_downloads,
        "starting downloads"
    );

    let client = HttpClient::new(config.max_download_time())?;
    let runner = BatchRunner::new(config.max_concurrent_downloads);

    let summary = runner.run(&config, &client, cancel).await?;
    Ok(summary)
}

/// Cancels the token on Ctrl-C or, on unix, SIGTERM.
///
/// Triggering twice is harmless: `CancellationToken::cancel` is idempotent.
fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "failed to register SIGTERM handler, falling back to Ctrl-C only");
            wait_for_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        () = wait_for_ctrl_c() => {}
        _ = sigterm.recv() => {
            warn!("cancellation requested via SIGTERM");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("cancellation requested via Ctrl-C"),
        Err(e) => {
            // Without a working signal handler, never resolve: cancellation
            // simply stays unavailable rather than firing spuriously.
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
