//! Embedding capacity for a carrier geometry.

use serde::{Deserialize, Serialize};

use crate::crypto::PREFIX_LEN;
use crate::error::StegoError;
use crate::frame::HEADER_LEN;

use super::pixels::{BitDepth, PixelBuffer};

/// Fixed bytes every embedded envelope spends before the payload:
/// salt (16) + nonce (12) + magic (4) + length (4) + CRC-32 (4) + flags (1).
pub const FRAME_OVERHEAD_BYTES: usize = PREFIX_LEN + HEADER_LEN;

/// Maximum payload that fits into a carrier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityResult {
    /// Largest stored payload (after compression) in bytes.
    pub capacity_bytes: usize,
    /// `capacity_bytes / 1024`, unrounded.
    pub capacity_kb: f64,
}

impl CapacityResult {
    fn from_bytes(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            capacity_kb: capacity_bytes as f64 / 1024.0,
        }
    }
}

/// Computes the payload capacity for a geometry and bit depth.
///
/// `capacity_bytes = floor(width * height * channels * bit_depth / 8) - FRAME_OVERHEAD_BYTES`,
/// clamped at zero. Runs in constant time.
pub fn capacity(
    width: u32,
    height: u32,
    channels: u8,
    bit_depth: u8,
) -> Result<CapacityResult, StegoError> {
    let depth = BitDepth::new(bit_depth)?;
    if width == 0 || height == 0 || channels == 0 {
        return Err(StegoError::invalid("image geometry must be non-zero"));
    }

    let raw = carrier_bytes(width as u64 * height as u64 * channels as u64, depth);
    Ok(CapacityResult::from_bytes(
        raw.saturating_sub(FRAME_OVERHEAD_BYTES),
    ))
}

/// Total bytes (envelope included) that `samples` can carry at `depth`.
pub fn carrier_bytes(samples: u64, depth: BitDepth) -> usize {
    let bytes = samples.saturating_mul(depth.get() as u64) / 8;
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

impl PixelBuffer {
    /// Payload capacity of this buffer at `depth`.
    pub fn capacity(&self, depth: BitDepth) -> CapacityResult {
        let raw = carrier_bytes(self.samples().len() as u64, depth);
        CapacityResult::from_bytes(raw.saturating_sub(FRAME_OVERHEAD_BYTES))
    }
}
