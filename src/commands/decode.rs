//! Decode command - recover a hidden message from an image.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stegsuite::{decode, AppConfig};

use super::{bit_depth_arg, load_carrier, CommandExecutor};

/// Recover a hidden message.
///
/// Use -o/--output to write raw bytes to a file (required for binary data).
/// Without -o, the message must be UTF-8 text and is printed.
#[derive(Args, Debug)]
pub struct DecodeCommand {
    /// Stego image
    #[arg(short, long)]
    pub image: PathBuf,

    /// Password used when encoding
    #[arg(short, long)]
    pub password: String,

    /// Bits per channel sample used when encoding (default from config)
    #[arg(short, long)]
    pub bits: Option<u8>,

    /// Write the recovered bytes to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CommandExecutor for DecodeCommand {
    fn execute(&self, config: &AppConfig) -> Result<()> {
        let carrier = load_carrier(&self.image)?;
        let decoder = config.engine.decoder(bit_depth_arg(self.bits)?);

        let message = decode(&carrier, &self.password, &decoder)
            .map_err(|e| anyhow::anyhow!(e.public_message()))?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, &message)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Wrote {} bytes to {}", message.len(), path.display());
            }
            None => {
                let text = String::from_utf8(message)
                    .context("Hidden data is not UTF-8 text; use --output to save it")?;
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", text)?;
            }
        }
        Ok(())
    }
}
