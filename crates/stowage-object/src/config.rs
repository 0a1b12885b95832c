//! Engine configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::types::{Error, Result};

// Default values
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const DEFAULT_BATCH_CONCURRENCY: usize = 4;
const DEFAULT_MAX_BUCKETS: usize = 5;

const MAX_BATCH_CONCURRENCY: usize = 64;

/// Timeouts and limits shared by the listing service, the fetcher and the
/// batch orchestrator.
///
/// Built once at start-up and shared immutably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(default)]
pub struct EngineConfig {
    /// Timeout in seconds for metadata and listing calls
    #[cfg_attr(
        feature = "config",
        arg(
            long = "request-timeout",
            env = "STOWAGE_REQUEST_TIMEOUT_SECS",
            default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
        )
    )]
    pub request_timeout_secs: u64,

    /// Timeout in seconds for a single body download
    #[cfg_attr(
        feature = "config",
        arg(
            long = "download-timeout",
            env = "STOWAGE_DOWNLOAD_TIMEOUT_SECS",
            default_value_t = DEFAULT_DOWNLOAD_TIMEOUT_SECS
        )
    )]
    pub download_timeout_secs: u64,

    /// Number of concurrent retrievals in a batch
    #[cfg_attr(
        feature = "config",
        arg(
            long = "batch-concurrency",
            env = "STOWAGE_BATCH_CONCURRENCY",
            default_value_t = DEFAULT_BATCH_CONCURRENCY
        )
    )]
    pub batch_concurrency: usize,

    /// Maximum number of buckets returned by bucket listing
    #[cfg_attr(
        feature = "config",
        arg(
            long = "max-buckets",
            env = "S3_MAX_BUCKETS",
            default_value_t = DEFAULT_MAX_BUCKETS
        )
    )]
    pub max_buckets: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            max_buckets: DEFAULT_MAX_BUCKETS,
        }
    }
}

impl EngineConfig {
    /// Returns the metadata and listing timeout.
    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the body download timeout.
    #[inline]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Set the metadata and listing timeout in seconds.
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set the download timeout in seconds.
    #[must_use]
    pub fn with_download_timeout_secs(mut self, secs: u64) -> Self {
        self.download_timeout_secs = secs;
        self
    }

    /// Set the batch worker count.
    #[must_use]
    pub fn with_batch_concurrency(mut self, workers: usize) -> Self {
        self.batch_concurrency = workers;
        self
    }

    /// Set the bucket listing cap.
    #[must_use]
    pub fn with_max_buckets(mut self, max: usize) -> Self {
        self.max_buckets = max;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(Error::invalid_request("request timeout must be at least 1 second"));
        }
        if self.download_timeout_secs == 0 {
            return Err(Error::invalid_request("download timeout must be at least 1 second"));
        }
        if !(1..=MAX_BATCH_CONCURRENCY).contains(&self.batch_concurrency) {
            return Err(Error::invalid_request(format!(
                "batch concurrency must be between 1 and {MAX_BATCH_CONCURRENCY}, got {}",
                self.batch_concurrency
            )));
        }
        if self.max_buckets == 0 {
            return Err(Error::invalid_request("max buckets must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.download_timeout(), Duration::from_secs(300));
        assert_eq!(config.max_buckets, 5);
    }

    #[test]
    fn concurrency_bounds() {
        assert!(EngineConfig::default().with_batch_concurrency(0).validate().is_err());
        assert!(EngineConfig::default().with_batch_concurrency(65).validate().is_err());
        assert!(EngineConfig::default().with_batch_concurrency(64).validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"batch_concurrency": 8}"#).unwrap();
        assert_eq!(config.batch_concurrency, 8);
        assert_eq!(config.request_timeout_secs, 30);
    }
}
