//! Bounded concurrent batch orchestrator.
//!
//! This module drives a whole download batch: one task per URL, all submitted
//! at once, with admission into the actively-transferring state gated by a
//! semaphore sized to the configured maximum. Per-job failures are isolated
//! at the job boundary; a shared [`CancellationToken`] is observed both while
//! waiting for a permit and during the transfer itself.
//!
//! # Concurrency Model
//!
//! - Each download runs in its own Tokio task
//! - A semaphore permit is acquired before the transfer starts
//! - Permits are released automatically on every exit path (RAII)
//! - Cancellation is checked with a biased `select!` at both suspension points
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
//! println!("{}/{} downloads succeeded", summary.succeeded, summary.total);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::HttpClient;
use crate::config::Config;

/// Error type for a batch run.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// At least one job was terminated by the cancellation token.
    ///
    /// Distinct from per-job failure: jobs that had already finished keep
    /// their outcomes, but no summary is produced. A token that only fires
    /// after the last job has finished leaves the summary intact.
    #[error("batch cancelled before completion")]
    Cancelled,

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Terminal state of a single download job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// The file was transferred and written completely.
    Succeeded,
    /// The transfer failed; carries the error description.
    Failed(String),
    /// Cancellation fired before or during the transfer.
    Cancelled,
}

/// Immutable record of one job's terminal outcome.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// The URL this job transferred.
    pub url: String,
    /// The terminal status.
    pub status: JobStatus,
    /// Time from transfer start to terminal state. Zero when the job was
    /// cancelled before obtaining a permit.
    pub elapsed: Duration,
}

/// Aggregate result of a batch that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of jobs that succeeded.
    pub succeeded: usize,
    /// Total number of jobs in the batch.
    pub total: usize,
    /// Wall time for the whole batch.
    pub elapsed: Duration,
}

/// Orchestrator for bounded concurrent downloads.
///
/// Holds the concurrency limiter shared across all jobs of a run. The limiter
/// is the only cross-job coordination besides the cancellation token and an
/// atomic success counter.
#[derive(Debug)]
pub struct BatchRunner {
    /// Semaphore for concurrency control, sized to the configured maximum.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
}

impl BatchRunner {
    /// Creates a runner with `max_concurrent` permits.
    ///
    /// The value comes from an already-validated [`Config`], so it is assumed
    /// to be positive.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            concurrency: max_concurrent,
        }
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the number of currently free permits.
    ///
    /// Equals [`concurrency`](Self::concurrency) whenever no job is
    /// transferring; used by tests to verify permits are never leaked.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs every URL in `config` to a terminal outcome.
    ///
    /// Creates the output directory idempotently, fans out one task per URL,
    /// and waits for all of them. A non-cancellation error in one job never
    /// aborts its siblings.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::OutputDir`] if the output directory cannot be
    /// created, and [`BatchError::Cancelled`] if any job resolved by
    /// observing the cancellation token. The decision rests on job outcomes,
    /// not on the token itself: a token that fires only after every job has
    /// reached a terminal state still yields a summary.
    pub async fn run(
        &self,
        config: &Config,
        client: &HttpClient,
        cancel: CancellationToken,
    ) -> Result<BatchSummary, BatchError> {
        let started = Instant::now();
        let output_dir = PathBuf::from(&config.output_path);

        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| BatchError::OutputDir {
                path: output_dir.clone(),
                source,
            })?;

        info!(
            urls = config.urls.len(),
            output_dir = %output_dir.display(),
            max_concurrent = self.concurrency,
            "starting batch"
        );

        let succeeded = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(config.urls.len());

        for url in config.urls.iter().cloned() {
            handles.push(tokio::spawn(run_job(
                url,
                Arc::clone(&self.semaphore),
                client.clone(),
                output_dir.clone(),
                cancel.clone(),
                Arc::clone(&succeeded),
            )));
        }

        let total = handles.len();
        debug!(task_count = total, "waiting for downloads to complete");

        let mut cancelled = 0usize;

        for handle in handles {
            match handle.await {
                Ok(outcome) => match &outcome.status {
                    JobStatus::Succeeded => {
                        debug!(url = %outcome.url, elapsed_ms = outcome.elapsed.as_millis(), "job succeeded");
                    }
                    JobStatus::Failed(message) => {
                        debug!(url = %outcome.url, error = %message, "job failed");
                    }
                    JobStatus::Cancelled => {
                        debug!(url = %outcome.url, "job cancelled");
                        cancelled += 1;
                    }
                },
                // A panicked job is a failed job; it must not sink the batch
                Err(e) => warn!(error = %e, "download task panicked"),
            }
        }

        let elapsed = started.elapsed();

        if cancelled > 0 {
            warn!(cancelled, total, "downloads cancelled");
            return Err(BatchError::Cancelled);
        }

        let succeeded = succeeded.load(Ordering::SeqCst);
        info!(
            succeeded,
            total,
            elapsed_ms = elapsed.as_millis(),
            "batch complete"
        );

        Ok(BatchSummary {
            succeeded,
            total,
            elapsed,
        })
    }
}

/// Runs one job to its terminal outcome.
///
/// Sequence: wait for a permit (cancellable) → record start time → transfer
/// (cancellable) → release permit via RAII. Exactly one `JobOutcome` is
/// produced on every path.
async fn run_job(
    url: String,
    semaphore: Arc<Semaphore>,
    client: HttpClient,
    output_dir: PathBuf,
    cancel: CancellationToken,
    succeeded: Arc<AtomicUsize>,
) -> JobOutcome {
    let permit = tokio::select! {
        biased;

        () = cancel.cancelled() => {
            warn!(url = %url, "download cancelled before starting");
            return JobOutcome {
                url,
                status: JobStatus::Cancelled,
                elapsed: Duration::ZERO,
            };
        }

        permit = semaphore.clone().acquire_owned() => {
            match permit {
                Ok(permit) => permit,
                // The semaphore is never closed; treat a close as cancellation
                Err(_) => {
                    return JobOutcome {
                        url,
                        status: JobStatus::Cancelled,
                        elapsed: Duration::ZERO,
                    };
                }
            }
        }
    };

    // Held for the whole transfer, dropped on every exit path below
    let _permit = permit;

    let job_started = Instant::now();
    info!(url = %url, output_dir = %output_dir.display(), "downloading");

    let status = tokio::select! {
        biased;

        () = cancel.cancelled() => {
            warn!(url = %url, "download cancelled");
            JobStatus::Cancelled
        }

        result = client.download_to_file(&url, &output_dir) => {
            match result {
                Ok(path) => {
                    succeeded.fetch_add(1, Ordering::SeqCst);
                    info!(
                        url = %url,
                        path = %path.display(),
                        elapsed_ms = job_started.elapsed().as_millis(),
                        "download completed"
                    );
                    JobStatus::Succeeded
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "download failed");
                    JobStatus::Failed(e.to_string())
                }
            }
        }
    };

    JobOutcome {
        url,
        status,
        elapsed: job_started.elapsed(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_reports_configured_concurrency() {
        let runner = BatchRunner::new(4);
        assert_eq!(runner.concurrency(), 4);
        assert_eq!(runner.available_permits(), 4);
    }

    #[test]
    fn test_runner_single_permit() {
        let runner = BatchRunner::new(1);
        assert_eq!(runner.concurrency(), 1);
        assert_eq!(runner.available_permits(), 1);
    }

    #[test]
    fn test_batch_error_cancelled_display() {
        let msg = BatchError::Cancelled.to_string();
        assert!(msg.contains("cancelled"), "Expected 'cancelled' in: {msg}");
    }

    #[test]
    fn test_batch_error_output_dir_display_includes_path() {
        let error = BatchError::OutputDir {
            path: PathBuf::from("/tmp/out"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(error.to_string().contains("/tmp/out"));
    }

    #[test]
    fn test_job_status_equality() {
        assert_eq!(JobStatus::Succeeded, JobStatus::Succeeded);
        assert_ne!(
            JobStatus::Failed("HTTP 404".to_string()),
            JobStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_run_token_unobserved_by_any_job_still_summarizes() {
        // The token fired, but with no jobs nothing ever observed it; the
        // batch result therefore stands rather than turning into Cancelled.
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            urls: vec![],
            max_download_time_secs: 5,
            output_path: dir.path().to_str().unwrap().to_string(),
            max_concurrent_downloads: 2,
        };
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let runner = BatchRunner::new(config.max_concurrent_downloads);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = runner.run(&config, &client, cancel).await.unwrap();
        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.total, 0);
    }

    #[tokio::test]
    async fn test_run_fails_when_output_dir_uncreatable() {
        let config = Config {
            urls: vec!["https://example.com/a.pdf".to_string()],
            max_download_time_secs: 5,
            output_path: "/proc/definitely/not/creatable".to_string(),
            max_concurrent_downloads: 1,
        };
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let runner = BatchRunner::new(config.max_concurrent_downloads);

        let result = runner
            .run(&config, &client, CancellationToken::new())
            .await;

        assert!(matches!(result, Err(BatchError::OutputDir { .. })));
    }
}
