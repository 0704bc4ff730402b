//! SSH Bot - Entry point
//!
//! Parses the CLI, loads the configuration document and provisions every
//! host in it. Exits non-zero when the configuration cannot be loaded or
//! when any host failed.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ssh_bot::config::{Args, Config};
use ssh_bot::error::Result;
use ssh_bot::runner;
use ssh_bot::ssh::{PlatformProbe, RusshTransport};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging to stderr (stdout carries the progress output)
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let args = Args::parse();
    let config_path = args.config_path()?;

    info!("SSH Bot v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Loading configuration from {}", config_path.display());

    let config = Config::load(&config_path)?;
    info!("{} host(s) configured", config.hosts.len());

    let report = runner::run(&config, &RusshTransport::new(), &PlatformProbe).await;
    report.print_summary();

    if !report.all_succeeded() {
        error!("{} host(s) failed", report.failed().count());
        std::process::exit(1);
    }

    Ok(())
}
