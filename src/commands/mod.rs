//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod analyze;
mod capacity;
mod decode;
mod encode;
mod serve;

pub use analyze::AnalyzeCommand;
pub use capacity::CapacityCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use serve::ServeCommand;

use anyhow::{Context, Result};
use std::path::Path;

use stegsuite::stego::image;
use stegsuite::{BitDepth, PixelBuffer};

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments and the loaded
    /// configuration.
    fn execute(&self, config: &stegsuite::AppConfig) -> Result<()>;
}

/// Loads a carrier image from disk.
fn load_carrier(path: &Path) -> Result<PixelBuffer> {
    image::load_from_file(path)
        .with_context(|| format!("Failed to read image from {}", path.display()))
}

/// Validates an optional `--bits` argument.
fn bit_depth_arg(bits: Option<u8>) -> Result<Option<BitDepth>> {
    bits.map(|b| BitDepth::new(b).context("Invalid --bits value"))
        .transpose()
}
