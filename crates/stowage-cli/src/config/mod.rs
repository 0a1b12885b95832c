//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── engine: EngineConfig   # Timeouts, batch concurrency, bucket cap
//! ├── store: StoreConfig     # Backend selection, S3 connection, allowlist
//! ├── logging: LogConfig     # Log output format
//! └── command: Command       # Operation to run
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod logging;
mod store;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use logging::LogConfig;
use stowage_object::EngineConfig;
pub use store::StoreConfig;

use crate::command::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "stowage")]
#[command(about = "Retrieve objects from S3-compatible object stores")]
#[command(version)]
pub struct Cli {
    /// Engine timeouts and limits.
    #[clap(flatten)]
    pub engine: EngineConfig,

    /// Store backend and connection settings.
    #[clap(flatten)]
    pub store: StoreConfig,

    /// Log output settings.
    #[clap(flatten)]
    pub logging: LogConfig,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so that its
    /// variables act as defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine
            .validate()
            .context("invalid engine configuration")?;
        self.store
            .validate()
            .context("invalid store configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        Self::log_build_info();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.engine.request_timeout_secs,
            download_timeout_secs = self.engine.download_timeout_secs,
            batch_concurrency = self.engine.batch_concurrency,
            max_buckets = self.engine.max_buckets,
            "Engine configuration"
        );
        self.store.log();
    }

    /// Logs build information at debug level.
    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [
            cfg!(feature = "dotenv").then_some("dotenv"),
            cfg!(feature = "pdf").then_some("pdf"),
            cfg!(feature = "schema").then_some("schema"),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_options_and_subcommand() {
        let cli = Cli::try_parse_from([
            "stowage",
            "--backend",
            "local",
            "--local-root",
            "/data",
            "--batch-concurrency",
            "8",
            "get-objects",
            "bucket",
            "--prefix",
            "35117/",
            "--output-dir",
            "/tmp/35117/",
            "--max-bytes",
            "1000000",
        ])
        .unwrap();

        assert_eq!(cli.engine.batch_concurrency, 8);
        assert!(cli.store.local_root.is_some());
        assert!(matches!(cli.command, Command::GetObjects { .. }));
    }
}
