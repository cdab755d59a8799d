//! Message encoding into a carrier image.
//!
//! This module orchestrates the encoding process:
//! 1. Frame the message (optional DEFLATE, length, CRC-32)
//! 2. Check that salt + nonce + frame fit into the carrier
//! 3. Derive a key from the password with a fresh salt and nonce
//! 4. Encrypt the frame with ChaCha20
//! 5. Embed prefix and ciphertext into the low bits of the samples
//! 6. Score the result with the steganalysis detectors
//!
//! The input buffer is never modified; a new buffer is returned.

use tracing::debug;
use zeroize::Zeroizing;

use crate::analysis::{analyze, AnalysisReport};
use crate::crypto::{EncryptionContext, KdfParams, PREFIX_LEN};
use crate::error::StegoError;
use crate::frame::compression::compression_ratio;
use crate::frame::frame;
use crate::stego::capacity::carrier_bytes;
use crate::stego::{lsb, BitDepth, PixelBuffer};

/// Configuration for the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Low-order bits used per channel sample.
    pub bit_depth: BitDepth,
    /// Try to DEFLATE the message before framing.
    pub compress: bool,
    /// Argon2id cost parameters.
    pub kdf: KdfParams,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            bit_depth: BitDepth::default(),
            compress: true,
            kdf: KdfParams::default(),
        }
    }
}

/// Result of encoding a message.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// The carrier with the message embedded.
    pub pixels: PixelBuffer,
    /// Steganalysis report of `pixels`.
    pub report: AnalysisReport,
    /// Bytes written into the carrier (prefix and encrypted frame).
    pub embedded_bytes: usize,
    /// Whether the message was stored compressed.
    pub compressed: bool,
}

/// Hides `message` in a copy of `buffer`, protected by `password`.
///
/// # Errors
/// * [`StegoError::InvalidParameter`] on an empty password
/// * [`StegoError::CapacityExceeded`] when the envelope does not fit; this
///   is detected before the key is derived
/// * [`StegoError::KeyDerivation`] when the KDF parameters are rejected
pub fn encode(
    buffer: &PixelBuffer,
    message: &[u8],
    password: &str,
    config: &EncoderConfig,
) -> Result<EncodedImage, StegoError> {
    if password.is_empty() {
        return Err(StegoError::invalid("password must not be empty"));
    }

    let framed = frame(message, config.compress)?;

    let envelope_len = PREFIX_LEN + framed.len();
    let available = carrier_bytes(buffer.samples().len() as u64, config.bit_depth);
    if envelope_len > available {
        return Err(StegoError::CapacityExceeded {
            needed: envelope_len,
            capacity: available,
        });
    }

    let context = EncryptionContext::generate(password, &config.kdf)?;
    let plaintext = Zeroizing::new(framed.to_bytes());

    let mut envelope = Vec::with_capacity(envelope_len);
    envelope.extend_from_slice(&context.prefix());
    envelope.extend_from_slice(&context.encrypt(&plaintext));

    let pixels = lsb::embed(buffer, &envelope, config.bit_depth)?;
    let report = analyze(&pixels);

    debug!(
        message_len = message.len(),
        embedded = envelope.len(),
        available,
        bit_depth = config.bit_depth.get(),
        compressed = framed.header().compressed,
        ratio = compression_ratio(message.len(), framed.stored_bytes().len()),
        "encoded message"
    );

    Ok(EncodedImage {
        pixels,
        report,
        embedded_bytes: envelope.len(),
        compressed: framed.header().compressed,
    })
}
