//! # Strata Engine
//!
//! Headless driver for Strata destructible terrain.
//!
//! Generates a procedural planet, attaches it to a physics world and
//! simulates surface impacts, logging regeneration statistics.
//!
//! Usage: `strata [config.toml]` (defaults to `strata.toml`).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{EngineConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("strata=info".parse()?))
        .init();

    info!("Strata starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let mut config = EngineConfig::load_from(&path);
    config.validate();

    let report = app::run(&config)?;
    info!(
        "Run complete: {} ticks, {} impacts, {} cells rebuilt, {} -> {} bodies",
        report.ticks,
        report.impacts,
        report.rebuilt_cells,
        report.initial.totals.bodies,
        report.last.totals.bodies
    );

    info!("Strata shutdown complete");
    Ok(())
}
