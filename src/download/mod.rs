//! Bounded concurrent HTTP downloads with streaming to disk.
//!
//! This module contains the batch orchestrator and the single-file transfer
//! it invokes repeatedly.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Concurrency ceiling enforced by a shared semaphore
//! - Cooperative cancellation at every suspension point
//! - Per-job failure isolation with structured error types
//!
//! # Example
//!
//! ```no_run
//! use batchfetch_core::config::Config;
//! use batchfetch_core::download::{BatchRunner, HttpClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(config: Config) -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(config.max_download_time())?;
//! let runner = BatchRunner::new(config.max_concurrent_downloads);
//! let summary = runner.run(&config, &client, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

mod batch;
mod client;
mod error;
mod filename;

pub use batch::{BatchError, BatchRunner, BatchSummary, JobOutcome, JobStatus};
pub use client::HttpClient;
pub use error::DownloadError;
pub use filename::filename_from_url;
