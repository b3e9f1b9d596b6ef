//! Firedrill CLI - incident response training simulator.
//!
//! `serve` hosts the simulation behind the JSON-RPC gateway, `play` is a
//! terminal client for it, and `config show` prints the resolved
//! configuration.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use firedrill_config::Config;
use firedrill_telemetry::{LogConfig, LogFormat};

mod commands;
mod render;
mod theme;

use commands::{config, play, serve};

/// Firedrill - incident response training simulator
#[derive(Parser)]
#[command(name = "firedrill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "FIREDRILL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Host the simulation until Ctrl-C
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Fixed random seed for a reproducible drill
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Join a running simulation from the terminal
    Play {
        /// Gateway URL (defaults to the configured address)
        #[arg(long)]
        url: Option<String>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let resolved = Config::load(cli.config.as_deref());

    // Set up logging from config, with --verbose override.
    let mut log_config = resolved
        .as_ref()
        .ok()
        .and_then(|r| LogConfig::from_section(&r.config.logging).ok())
        .unwrap_or_else(|| LogConfig::new("info").with_format(LogFormat::Compact));
    if cli.verbose {
        "debug".clone_into(&mut log_config.level);
    }
    if let Err(e) = firedrill_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let resolved = resolved?;
    match cli.command {
        Commands::Serve { port, seed } => serve::run(resolved.config, port, seed).await,
        Commands::Play { url } => {
            let url = url.unwrap_or_else(|| format!("ws://{}", resolved.config.gateway.address()));
            play::run(&url).await
        },
        Commands::Config {
            command: ConfigCommands::Show,
        } => config::show(&resolved),
    }
}
