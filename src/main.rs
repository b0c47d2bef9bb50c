//! pipemux demo server.
//!
//! Serves the routes assembled in [`pipemux::app`] until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use clap::Parser;

use pipemux::config::{load_config, ServerConfig};
use pipemux::observability::logging;
use pipemux::{app, lifecycle};

#[derive(Parser, Debug)]
#[command(name = "pipemux", version, about = "Pipe-based HTTP request multiplexer")]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g., 0.0.0.0:8080).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(
        config = ?cli.config,
        bind = %config.listener.bind_address,
        "Starting pipemux"
    );

    let router = app::build_router(&config)?;
    lifecycle::start(config, router).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
