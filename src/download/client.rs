//! HTTP client wrapper for streaming single-file transfers.
//!
//! The client is created once per batch and reused for every download, taking
//! advantage of reqwest's connection pooling. The per-download timeout from
//! the configuration is applied to the overall request lifetime, not just
//! connection setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;
use url::Url;

use super::error::DownloadError;
use super::filename::filename_from_url;

/// Default connect timeout applied in addition to the overall timeout.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// HTTP client for downloading files with streaming support.
///
/// # Example
///
/// ```no_run
/// use batchfetch_core::download::HttpClient;
/// use std::path::Path;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(Duration::from_secs(120))?;
/// let path = client
///     .download_to_file("https://example.com/files/report.pdf", Path::new("./downloads"))
///     .await?;
/// println!("Downloaded to: {}", path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client whose requests are bounded by `overall_timeout`.
    ///
    /// The timeout covers the full request lifetime (connect, headers, and
    /// body read), so a stalled body read fails the job rather than hanging
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns the underlying builder error if the TLS backend cannot be
    /// initialized.
    pub fn new(overall_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(overall_timeout)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }

    /// Downloads one URL into `output_dir`, streaming the body to disk.
    ///
    /// The destination filename is the URL's final path segment (see
    /// [`filename_from_url`]). The file is created or truncated at the start
    /// of the write; a failed transfer leaves the partial file in place.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns a non-2xx status
    /// - Writing to disk fails
    #[must_use = "download result contains the path to the downloaded file"]
    pub async fn download_to_file(
        &self,
        url: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let parsed_url =
            Url::parse(url).map_err(|_| DownloadError::invalid_url(url.to_string()))?;

        let file_path = output_dir.join(filename_from_url(&parsed_url));
        debug!(path = %file_path.display(), "resolved destination path");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        // Create/truncate the destination; overwrite semantics by design
        let file = File::create(&file_path)
            .await
            .map_err(|e| DownloadError::io(file_path.clone(), e))?;

        let bytes_written = stream_to_file(file, response, url, &file_path).await?;

        debug!(
            path = %file_path.display(),
            bytes = bytes_written,
            "transfer complete"
        );

        Ok(file_path)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Streams the response body to `file` chunk by chunk, returning bytes written.
///
/// The body is never buffered whole; each chunk is written through a
/// `BufWriter` and the writer is flushed before returning.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}
