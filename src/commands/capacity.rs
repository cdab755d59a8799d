//! Capacity command - how many bytes an image can hide.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use stegsuite::{capacity_of, AppConfig};

use super::{bit_depth_arg, load_carrier, CommandExecutor};

/// Show how much data an image can carry.
#[derive(Args, Debug)]
pub struct CapacityCommand {
    /// Carrier image (PNG, BMP or JPEG)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Bits per channel sample (1-8, default from config)
    #[arg(short, long)]
    pub bits: Option<u8>,
}

impl CommandExecutor for CapacityCommand {
    fn execute(&self, config: &AppConfig) -> Result<()> {
        let bit_depth = bit_depth_arg(self.bits)?.unwrap_or_else(|| config.engine.bit_depth());
        let buffer = load_carrier(&self.image)?;
        let capacity = capacity_of(&buffer, bit_depth);

        println!(
            "Image: {}x{} ({} channels)",
            buffer.width(),
            buffer.height(),
            buffer.channels()
        );
        println!("Bits per sample: {}", bit_depth);
        println!(
            "Capacity: {} bytes ({:.2} KB)",
            capacity.capacity_bytes, capacity.capacity_kb
        );
        Ok(())
    }
}
