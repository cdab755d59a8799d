//! # Stegsuite - LSB image steganography
//!
//! Stegsuite hides password-protected messages in the low-order bits of
//! raster image samples and estimates how detectable the result is.
//!
//! ## Overview
//!
//! - Messages are **framed** (magic, length, CRC-32) and optionally
//!   **compressed** with DEFLATE
//! - Frames are **encrypted** with ChaCha20 under a key derived from the
//!   password with Argon2id (fresh salt and nonce for every encode)
//! - The envelope is **embedded** in 1 to 8 low bits of every channel sample
//! - Decoding is **all-or-nothing**: the exact message or an error
//! - A **steganalysis scorer** (chi-square attack + RS analysis) rates how
//!   easy the hidden data is to detect
//!
//! ## Example Usage
//!
//! ```rust
//! use stegsuite::{decode, encode, DecoderConfig, EncoderConfig, KdfParams, PixelBuffer};
//!
//! let carrier = PixelBuffer::from_fn(64, 64, 3, |x, y, c| (x * 4 + y * 2 + c as u32) as u8).unwrap();
//!
//! let encoder = EncoderConfig { kdf: KdfParams::new(64, 1, 1), ..Default::default() };
//! let encoded = encode(&carrier, b"meet at dawn", "secret", &encoder).unwrap();
//! println!("security score: {:.2}", encoded.report.security_score);
//!
//! let decoder = DecoderConfig { bit_depth: encoder.bit_depth, kdf: encoder.kdf };
//! let message = decode(&encoded.pixels, "secret", &decoder).unwrap();
//! assert_eq!(message, b"meet at dawn");
//! ```
//!
//! ## Modules
//!
//! - [`stego`]: pixel buffers, capacity, LSB embedding, image files
//! - [`frame`]: payload framing and compression
//! - [`crypto`]: key derivation and stream encryption
//! - [`analysis`]: steganalysis scoring
//! - [`encoder`] / [`decoder`]: the full pipelines
//! - [`config`]: TOML configuration
//! - [`server`]: HTTP API

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod analysis;
pub mod config;
pub mod crypto;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod server;
pub mod stego;

pub use analysis::{analyze, AnalysisReport, DetectionRisk, SecurityLevel};
pub use config::AppConfig;
pub use crypto::KdfParams;
pub use decoder::{decode, DecoderConfig};
pub use encoder::{encode, EncodedImage, EncoderConfig};
pub use error::StegoError;
pub use stego::{capacity, BitDepth, CapacityResult, PixelBuffer};

/// Payload capacity of a buffer at `bit_depth`.
pub fn capacity_of(buffer: &PixelBuffer, bit_depth: BitDepth) -> CapacityResult {
    buffer.capacity(bit_depth)
}
