//! Batchfetch Core Library
//!
//! This library downloads a configured list of URLs to a local directory with
//! a bounded number of simultaneous transfers and graceful cancellation.
//!
//! # Architecture
//!
//! - [`config`] - JSON configuration loading and validation
//! - [`download`] - the batch orchestrator and streaming single-file transfer

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use download::{
    BatchError, BatchRunner, BatchSummary, DownloadError, HttpClient, JobOutcome, JobStatus,
};
