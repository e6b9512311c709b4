//! Runs a file through a full upload and download between two endpoints.
//!
//! Usage: `bleft-loopback <file> [config.toml]`

mod app;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args_os().skip(1);
    let file = args
        .next()
        .map(PathBuf::from)
        .context("usage: bleft-loopback <file> [config.toml]")?;
    let config_path = match args.next() {
        Some(p) => PathBuf::from(p),
        None => config::default_config_path(),
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting bleft loopback");

    let config = config::Config::load(&config_path)?;
    tracing::info!(path = %config_path.display(), "configuration loaded");

    let received = app::run(&config, &file)?;
    tracing::info!(path = %received.display(), "loopback complete");
    Ok(())
}
