//! Stegsuite - LSB image steganography
//!
//! A CLI for hiding password-protected messages in images, recovering them,
//! and estimating how detectable they are.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use commands::{
    AnalyzeCommand, CapacityCommand, CommandExecutor, DecodeCommand, EncodeCommand, ServeCommand,
};
use stegsuite::AppConfig;

/// Stegsuite - LSB image steganography
///
/// Hide encrypted messages in the low bits of image pixels and check how
/// detectable they are.
#[derive(Parser)]
#[command(name = "stegsuite")]
#[command(version = stegsuite::VERSION)]
#[command(about = "LSB image steganography with encryption and steganalysis")]
#[command(long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how many bytes an image can hide
    Capacity(CapacityCommand),

    /// Hide a message in an image
    Encode(EncodeCommand),

    /// Recover a hidden message
    Decode(DecodeCommand),

    /// Estimate how detectable hidden data is
    Analyze(AnalyzeCommand),

    /// Run the HTTP API
    Serve(ServeCommand),
}

impl Commands {
    fn executor(&self) -> &dyn CommandExecutor {
        match self {
            Commands::Capacity(cmd) => cmd,
            Commands::Encode(cmd) => cmd,
            Commands::Decode(cmd) => cmd,
            Commands::Analyze(cmd) => cmd,
            Commands::Serve(cmd) => cmd,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    debug!(?config, "configuration loaded");

    cli.command.executor().execute(&config)
}
