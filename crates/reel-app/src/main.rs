//! Reel - headless front end for the timeline engine
//!
//! Inspects project files, probes media, groups clips and drives exports.

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Cli;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // RUST_LOG overrides the default level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    info!("Reel {} starting", env!("CARGO_PKG_VERSION"));
    commands::run(cli)
}
