//! Store backend configuration.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use stowage_object::providers::{LocalProvider, S3Config, S3Provider, StoreProvider};

use crate::TRACING_TARGET_CONFIG;

/// Prefix of the numbered bucket allowlist variables (`S3_BUCKET_1`, ...).
const NUMBERED_BUCKET_PREFIX: &str = "S3_BUCKET_";

/// Object store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// S3 or an S3-compatible service.
    #[default]
    S3,
    /// Subdirectories of a local directory.
    Local,
}

/// Store backend and connection settings.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Object store backend
    #[arg(long, env = "STOWAGE_BACKEND", value_enum, default_value_t = Backend::S3)]
    pub backend: Backend,

    /// Root directory for the local backend; each subdirectory is a bucket
    #[arg(long, env = "STOWAGE_LOCAL_ROOT")]
    pub local_root: Option<PathBuf>,

    /// S3 connection settings.
    #[clap(flatten)]
    pub s3: S3Config,
}

impl StoreConfig {
    /// Validates the settings of the selected backend.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.backend {
            Backend::S3 => self.s3.validate().map_err(|e| anyhow!(e)),
            Backend::Local => match &self.local_root {
                Some(root) if root.is_dir() => Ok(()),
                Some(root) => Err(anyhow!(
                    "local root '{}' is not a directory",
                    root.display()
                )),
                None => Err(anyhow!("--local-root is required for the local backend")),
            },
        }
    }

    /// Returns the S3 settings with the numbered allowlist applied when
    /// `S3_BUCKETS` is not set.
    pub fn s3_config(&self) -> S3Config {
        let mut config = self.s3.clone();
        if config.buckets.is_empty() {
            config.buckets = numbered_buckets(|name| env::var(name).ok());
        }
        config
    }

    /// Creates the provider for the selected backend.
    pub fn create_provider(&self) -> anyhow::Result<Arc<dyn StoreProvider>> {
        let provider: Arc<dyn StoreProvider> = match self.backend {
            Backend::S3 => Arc::new(S3Provider::new(self.s3_config())),
            Backend::Local => {
                let root = self
                    .local_root
                    .as_ref()
                    .context("--local-root is required for the local backend")?;
                Arc::new(LocalProvider::new(root)?)
            }
        };
        Ok(provider)
    }

    /// Logs the store configuration (no credentials).
    pub fn log(&self) {
        match self.backend {
            Backend::S3 => {
                let s3 = self.s3_config();
                tracing::info!(
                    target: TRACING_TARGET_CONFIG,
                    backend = "s3",
                    region = %s3.region,
                    endpoint = ?s3.endpoint,
                    buckets = ?s3.allowlist(),
                    static_credentials = s3.access_key_id.is_some(),
                    max_retries = s3.max_retries,
                    connect_timeout_secs = s3.connect_timeout_secs,
                    read_timeout_secs = s3.read_timeout_secs,
                    "Store configuration"
                );
            }
            Backend::Local => {
                tracing::info!(
                    target: TRACING_TARGET_CONFIG,
                    backend = "local",
                    root = ?self.local_root,
                    "Store configuration"
                );
            }
        }
    }
}

/// Collects `S3_BUCKET_1`, `S3_BUCKET_2`, ... up to the first missing one.
fn numbered_buckets(lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
    (1..)
        .map_while(|index| lookup(&format!("{NUMBERED_BUCKET_PREFIX}{index}")))
        .map(|bucket| bucket.trim().to_owned())
        .filter(|bucket| !bucket.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn numbered_buckets_stop_at_first_gap() {
        let vars: HashMap<&str, &str> = [
            ("S3_BUCKET_1", "reports"),
            ("S3_BUCKET_2", " logs "),
            ("S3_BUCKET_4", "skipped"),
        ]
        .into_iter()
        .collect();

        let buckets = numbered_buckets(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(buckets, vec!["reports", "logs"]);
    }

    #[test]
    fn local_backend_requires_existing_root() {
        let mut config = StoreConfig {
            backend: Backend::Local,
            local_root: None,
            s3: S3Config::default(),
        };
        assert!(config.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        config.local_root = Some(dir.path().to_path_buf());
        assert!(config.validate().is_ok());
        assert!(config.create_provider().is_ok());
    }
}
