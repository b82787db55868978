#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;
mod telemetry;

use std::io::Write;
use std::process;

use anyhow::Context;

use crate::command::App;
use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "erlene_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "erlene_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "erlene_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "erlene_cli::command";

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
        let message = format!("{error:#}");
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %message,
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    telemetry::init_tracing(cli.log_format)?;
    log_startup_info();
    cli.log_config();

    let app = App::from_cli(&cli).context("failed to initialize integrations")?;

    let mut stdout = std::io::stdout().lock();
    cli.command.run(&app, &mut stdout).await?;
    stdout.flush().context("failed to flush output")?;

    Ok(())
}

/// Logs startup information.
fn log_startup_info() {
    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        arch = std::env::consts::ARCH,
        os = std::env::consts::OS,
        features = ?enabled_features(),
        "starting erlene"
    );
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}
