//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download a configured list of URLs with bounded concurrency.
///
/// Batchfetch reads a JSON configuration file describing the URL list, output
/// directory, per-download timeout, and concurrency limit, then downloads
/// everything with graceful Ctrl-C/SIGTERM cancellation.
#[derive(Parser, Debug)]
#[command(name = "batchfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the JSON config file
    #[arg(short = 'c', long)]
    pub config: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
