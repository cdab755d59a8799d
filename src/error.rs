//! Error types shared by the steganography engine.

use thiserror::Error;

use crate::frame::compression::CompressionError;

/// Message reported to callers for every decode-time failure.
///
/// Wrong password, wrong bit depth, a carrier without hidden data and a
/// lossily re-saved image all produce this same text.
pub const DECODE_FAILED_MESSAGE: &str =
    "Decode failed: no hidden data found, wrong password, or wrong bit depth";

/// Errors that can occur while computing capacity, encoding, decoding or
/// analyzing a carrier.
#[derive(Error, Debug)]
pub enum StegoError {
    /// A caller-supplied parameter is out of range (bit depth, geometry,
    /// empty password).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The framed and encrypted payload does not fit into the carrier.
    #[error("Payload too large: need {needed} bytes, carrier holds {capacity}")]
    CapacityExceeded {
        /// Bytes the embedded envelope needs.
        needed: usize,
        /// Bytes the carrier can hold at the requested bit depth.
        capacity: usize,
    },

    /// The frame magic or flags did not match.
    #[error("No hidden data found or wrong parameters")]
    CorruptFrame,

    /// The frame checksum did not match its payload.
    #[error("Hidden data is corrupted or the password/bit depth is wrong")]
    ChecksumMismatch,

    /// The payload was flagged as compressed but could not be inflated.
    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    /// The carrier could not be turned into a pixel buffer (or back).
    #[error("Image format error: {0}")]
    ImageFormatError(String),

    /// Argon2 rejected its parameters.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

impl StegoError {
    /// Returns true for the failures that must be reported as one generic
    /// decode failure.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::CorruptFrame | Self::ChecksumMismatch | Self::DecompressionError(_)
        )
    }

    /// Returns the text that may be shown to the caller.
    ///
    /// Decode failures collapse into [`DECODE_FAILED_MESSAGE`].
    pub fn public_message(&self) -> String {
        if self.is_decode_failure() {
            DECODE_FAILED_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

impl From<CompressionError> for StegoError {
    fn from(err: CompressionError) -> Self {
        match err {
            CompressionError::CompressionFailed(msg) | CompressionError::DecompressionFailed(msg) => {
                Self::DecompressionError(msg)
            }
        }
    }
}
