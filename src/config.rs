//! Batch configuration: JSON document loading and validation.
//!
//! A [`Config`] is loaded from a JSON file and validated immediately, so the
//! rest of the crate can treat it as an already-valid value. The orchestrator
//! never re-checks these invariants.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating a configuration file.
///
/// All variants are fatal to startup; none of them reach the orchestrator.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist or could not be read.
    #[error("config file not found or unreadable: {path}")]
    NotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON or is missing required fields.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the malformed file.
        path: PathBuf,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The URL list is empty.
    #[error("configuration must contain at least one URL")]
    EmptyUrlList,

    /// The output path is empty or whitespace-only.
    #[error("outputPath cannot be blank")]
    BlankOutputPath,

    /// The concurrency limit is zero.
    #[error("maxConcurrentDownloads must be greater than zero")]
    InvalidConcurrency,

    /// The per-download timeout is zero.
    #[error("maxDownloadTimeSecs must be greater than zero")]
    InvalidTimeout,
}

/// Validated batch configuration.
///
/// Field names map to camelCase keys in the JSON document; unknown keys are
/// ignored so documents can carry comments or tooling metadata. E.g.:
///
/// ```json
/// {
///   "urls": ["https://example.com/files/report.pdf"],
///   "maxDownloadTimeSecs": 120,
///   "outputPath": "./downloads",
///   "maxConcurrentDownloads": 4
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Ordered list of URLs to download. Must be non-empty.
    pub urls: Vec<String>,
    /// Overall per-download timeout in seconds (connect + body read).
    pub max_download_time_secs: u64,
    /// Directory downloads are written into. Created if missing.
    pub output_path: String,
    /// Maximum number of simultaneously transferring downloads.
    pub max_concurrent_downloads: usize,
}

impl Config {
    /// Loads a configuration from a JSON file and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not a valid config document, or a
    /// validation variant if a field invariant is violated.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        // Validate immediately so callers only ever see valid configs
        config.validate()?;

        debug!(
            urls = config.urls.len(),
            output_path = %config.output_path,
            max_concurrent = config.max_concurrent_downloads,
            timeout_secs = config.max_download_time_secs,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Checks the field invariants: non-empty URL list, non-blank output
    /// path, positive concurrency, positive timeout.
    ///
    /// # Errors
    ///
    /// Returns the matching [`ConfigError`] variant for the first violated
    /// invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urls.is_empty() {
            return Err(ConfigError::EmptyUrlList);
        }

        if self.output_path.trim().is_empty() {
            return Err(ConfigError::BlankOutputPath);
        }

        if self.max_concurrent_downloads == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        if self.max_download_time_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    /// Per-download timeout as a [`Duration`].
    #[must_use]
    pub fn max_download_time(&self) -> Duration {
        Duration::from_secs(self.max_download_time_secs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            urls: vec!["https://example.com/a.pdf".to_string()],
            max_download_time_secs: 60,
            output_path: "./out".to_string(),
            max_concurrent_downloads: 4,
        }
    }

    #[test]
    fn test_validate_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_url_list() {
        let mut config = valid_config();
        config.urls.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyUrlList)));
    }

    #[test]
    fn test_validate_rejects_blank_output_path() {
        let mut config = valid_config();
        config.output_path = "   ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BlankOutputPath)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = valid_config();
        config.max_concurrent_downloads = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency)
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = valid_config();
        config.max_download_time_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout)));
    }

    #[test]
    fn test_load_from_file_parses_camel_case_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "urls": ["https://example.com/files/report.pdf"],
                "maxDownloadTimeSecs": 120,
                "outputPath": "./downloads",
                "maxConcurrentDownloads": 3
            }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.urls.len(), 1);
        assert_eq!(config.max_download_time(), Duration::from_secs(120));
        assert_eq!(config.output_path, "./downloads");
        assert_eq!(config.max_concurrent_downloads, 3);
    }

    #[test]
    fn test_load_from_file_ignores_unknown_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "urls": ["https://example.com/a.pdf"],
                "maxDownloadTimeSecs": 60,
                "outputPath": "./out",
                "maxConcurrentDownloads": 2,
                "comment": "extra keys must not break loading"
            }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.max_concurrent_downloads, 2);
    }

    #[test]
    fn test_load_from_file_missing_file_returns_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = Config::load_from_file(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_load_from_file_malformed_json_returns_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = Config::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_from_file_rejects_invalid_field_values() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "urls": [],
                "maxDownloadTimeSecs": 120,
                "outputPath": "./downloads",
                "maxConcurrentDownloads": 3
            }"#,
        )
        .unwrap();

        let result = Config::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::EmptyUrlList)));
    }

    #[test]
    fn test_config_error_display_names_invariant() {
        assert!(
            ConfigError::EmptyUrlList
                .to_string()
                .contains("at least one URL")
        );
        assert!(
            ConfigError::InvalidConcurrency
                .to_string()
                .contains("maxConcurrentDownloads")
        );
    }
}
