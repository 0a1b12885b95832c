//! Log output configuration.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
///
/// Logs are always written to stderr; stdout carries command results only.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log line format.
    #[arg(long, env = "STOWAGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl LogConfig {
    /// Initializes tracing with `RUST_LOG` filtering (default `info`).
    pub fn init_tracing(&self) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let (text, json) = match self.log_format {
            LogFormat::Text => (Some(fmt::layer().with_writer(std::io::stderr)), None),
            LogFormat::Json => (
                None,
                Some(fmt::layer().json().with_writer(std::io::stderr)),
            ),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(text)
            .with(json)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

        Ok(())
    }
}
