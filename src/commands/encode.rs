//! Encode command - hide a message or file in an image.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stegsuite::stego::image;
use stegsuite::{encode, AppConfig};

use super::{bit_depth_arg, load_carrier, CommandExecutor};

/// Hide a message in an image.
///
/// The output is always written as PNG; lossy formats would destroy the
/// hidden bits.
#[derive(Args, Debug)]
pub struct EncodeCommand {
    /// Carrier image (PNG, BMP or JPEG)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Where to write the stego image (PNG)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Text message to hide (mutually exclusive with --file)
    #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
    pub message: Option<String>,

    /// File whose bytes to hide (mutually exclusive with --message)
    #[arg(short, long, conflicts_with = "message")]
    pub file: Option<PathBuf>,

    /// Password protecting the message
    #[arg(short, long)]
    pub password: String,

    /// Bits per channel sample (1-8, default from config)
    #[arg(short, long)]
    pub bits: Option<u8>,

    /// Store the message uncompressed
    #[arg(long)]
    pub no_compression: bool,
}

impl EncodeCommand {
    fn message_bytes(&self) -> Result<Vec<u8>> {
        match (&self.message, &self.file) {
            (Some(message), _) => Ok(message.as_bytes().to_vec()),
            (None, Some(path)) => std::fs::read(path)
                .with_context(|| format!("Failed to read message file {}", path.display())),
            (None, None) => anyhow::bail!("Either --message or --file is required"),
        }
    }
}

impl CommandExecutor for EncodeCommand {
    fn execute(&self, config: &AppConfig) -> Result<()> {
        let message = self.message_bytes()?;
        let carrier = load_carrier(&self.image)?;

        let compress = if self.no_compression { Some(false) } else { None };
        let encoder = config.engine.encoder(bit_depth_arg(self.bits)?, compress);

        let encoded = encode(&carrier, &message, &self.password, &encoder)
            .context("Failed to hide message")?;

        image::save_png(&encoded.pixels, &self.output)
            .with_context(|| format!("Failed to write image to {}", self.output.display()))?;

        println!("Hidden {} bytes in {}", message.len(), self.output.display());
        println!(
            "Embedded {} bytes at {} bits per sample{}",
            encoded.embedded_bytes,
            encoder.bit_depth,
            if encoded.compressed { " (compressed)" } else { "" }
        );
        println!(
            "Security score: {:.1}% ({})",
            encoded.report.security_score * 100.0,
            encoded.report.security_level
        );
        Ok(())
    }
}
