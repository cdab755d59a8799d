//! Application configuration loaded from TOML.
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) yields a working setup:
//!
//! ```toml
//! [engine]
//! default_bit_depth = 2
//! compression = true
//!
//! [engine.kdf]
//! memory_kib = 65536
//! iterations = 3
//! parallelism = 1
//!
//! [server]
//! bind_addr = "127.0.0.1:5000"
//! max_body_bytes = 33554432
//! ```

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use crate::crypto::KdfParams;
use crate::decoder::DecoderConfig;
use crate::encoder::EncoderConfig;
use crate::stego::BitDepth;

/// Default request body limit (32 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Smallest Argon2 memory cost accepted from a config file (KiB).
pub const MIN_KDF_MEMORY_KIB: u32 = 8;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid default bit depth {0} (must be 1-8)")]
    InvalidBitDepth(u8),
    #[error("invalid KDF parameters: {0}")]
    InvalidKdf(String),
    #[error("max_body_bytes must be greater than zero")]
    InvalidBodyLimit,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Steganography engine defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bit depth used when a request does not name one.
    pub default_bit_depth: u8,
    /// Whether messages are compressed when a request does not say.
    pub compression: bool,
    /// Argon2id cost parameters, shared by encoder and decoder.
    pub kdf: KdfParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_bit_depth: BitDepth::default().get(),
            compression: true,
            kdf: KdfParams::default(),
        }
    }
}

impl EngineConfig {
    /// Validates the engine section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        BitDepth::new(self.default_bit_depth)
            .map_err(|_| ConfigError::InvalidBitDepth(self.default_bit_depth))?;
        if self.kdf.memory_kib < MIN_KDF_MEMORY_KIB {
            return Err(ConfigError::InvalidKdf(format!(
                "memory_kib must be at least {}",
                MIN_KDF_MEMORY_KIB
            )));
        }
        self.kdf
            .validate()
            .map_err(|e| ConfigError::InvalidKdf(e.to_string()))
    }

    /// Default bit depth as a validated value.
    pub fn bit_depth(&self) -> BitDepth {
        BitDepth::new(self.default_bit_depth).unwrap_or_default()
    }

    /// Builds an encoder configuration, falling back to the defaults for
    /// the parameters a caller left out.
    pub fn encoder(&self, bit_depth: Option<BitDepth>, compress: Option<bool>) -> EncoderConfig {
        EncoderConfig {
            bit_depth: bit_depth.unwrap_or_else(|| self.bit_depth()),
            compress: compress.unwrap_or(self.compression),
            kdf: self.kdf,
        }
    }

    /// Builds a decoder configuration.
    pub fn decoder(&self, bit_depth: Option<BitDepth>) -> DecoderConfig {
        DecoderConfig {
            bit_depth: bit_depth.unwrap_or_else(|| self.bit_depth()),
            kdf: self.kdf,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: SocketAddr,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Validates the server section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::InvalidBodyLimit);
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.server.validate()
    }
}
