//! azscope - interactive terminal browser for Azure resources
//!
//! Entry point: logging to a file (the TUI owns stdout), configuration
//! from environment + flags, then the event loop. Exit code 0 on a
//! normal quit; a startup failure propagates as a non-zero exit.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use tracing::info;

use azscope::cli::Cli;
use azscope::config::Config;
use azscope::tui;

fn setup_logging(level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("azscope")
        .join("logs");
    fs::create_dir_all(&log_dir).context("failed to create log directory")?;

    let level = match level.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some("INFO") | None => tracing::Level::INFO,
        Some(other) => {
            eprintln!("warning: unknown log level '{}', using INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(log_dir.join("azscope.log")).context("failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("logging initialized (level {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    cli.apply(&mut config);

    setup_logging(config.log_level.as_deref()).context("failed to set up logging")?;
    info!(demo = config.demo, "azscope starting");

    tui::run(&config).await
}
