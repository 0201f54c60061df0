//! # sync-cli
//!
//! Demo tool for the wearsync protocol.
//!
//! Runs a primary device ("phone") and a companion ("watch") on an in-memory
//! mesh and prints the weather update the companion delivers, as JSON.
//!
//! ## Commands
//!
//! - `request`: the companion asks for weather and the primary answers
//! - `push`: the primary publishes without being asked
//!
//! ## Example
//!
//! ```bash
//! # Imperial primary, delivered as Fahrenheit
//! wearsync-cli request --high=-5 --low=-10 --imperial
//!
//! # Unsolicited push with a rain icon
//! wearsync-cli push --weather-id 500
//!
//! # Custom timeouts
//! wearsync-cli --config wearsync.toml request
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{push, request, WeatherArgs};
use config::FileConfig;

/// Demo tool for the wearsync protocol.
#[derive(Parser, Debug)]
#[command(name = "wearsync-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// How long to wait for the companion's update, in milliseconds
    #[arg(long, global = true, default_value_t = 2000)]
    wait_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Companion requests weather; primary publishes in reply
    Request(WeatherArgs),

    /// Primary publishes unsolicited
    Push(WeatherArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = FileConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let wait = Duration::from_millis(cli.wait_ms);

    match cli.command {
        Commands::Request(weather) => request::run(&config, &weather, wait).await?,
        Commands::Push(weather) => push::run(&config, &weather, wait).await?,
    }

    Ok(())
}
