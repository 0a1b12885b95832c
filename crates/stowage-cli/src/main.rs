#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod shutdown;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use stowage_object::ObjectEngine;
use stowage_object::tools::Toolbox;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "stowage_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "stowage_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "stowage_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "stowage_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "command completed successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format!("{error:#}"),
            "command terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    cli.logging
        .init_tracing()
        .context("failed to initialize tracing")?;
    cli.log();
    cli.validate()?;

    let provider = cli
        .store
        .create_provider()
        .context("failed to create store provider")?;
    let engine = ObjectEngine::from_shared(provider, Arc::new(cli.engine.clone()));
    let toolbox = Toolbox::new(engine);

    let cancel = CancellationToken::new();
    shutdown::cancel_on_signal(cancel.clone());

    cli.command.execute(&toolbox, cancel).await
}
