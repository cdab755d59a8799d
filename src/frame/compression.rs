//! Payload compression for the frame layer.
//!
//! Uses raw DEFLATE so that longer messages fit into the same carrier.
//! Whether the stored bytes are compressed is recorded in the frame flags,
//! not in the compressed stream itself.

use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;
use std::io::Read;
use thiserror::Error;

/// Upper bound on the inflated size of a single payload (64 MiB).
pub const MAX_INFLATED_LEN: u64 = 64 * 1024 * 1024;

/// Compression errors.
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Compresses data using the DEFLATE algorithm.
///
/// Returns `None` when compression does not make the data smaller, in
/// which case the caller should store the original bytes.
pub fn compress(data: &[u8]) -> Result<Option<Vec<u8>>, CompressionError> {
    if data.is_empty() {
        return Ok(None);
    }

    let mut encoder = DeflateEncoder::new(data, Compression::best());
    let mut compressed = Vec::new();

    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;

    // Only use compression if it actually reduces size
    if compressed.len() < data.len() {
        Ok(Some(compressed))
    } else {
        Ok(None)
    }
}

/// Decompresses DEFLATE data produced by [`compress`].
///
/// Fails on malformed streams and on streams that inflate beyond
/// [`MAX_INFLATED_LEN`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut decoder = DeflateDecoder::new(data).take(MAX_INFLATED_LEN + 1);
    let mut decompressed = Vec::new();

    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() as u64 > MAX_INFLATED_LEN {
        return Err(CompressionError::DecompressionFailed(format!(
            "inflated payload exceeds {} bytes",
            MAX_INFLATED_LEN
        )));
    }

    Ok(decompressed)
}

/// Returns compression ratio (compressed_size / original_size).
/// Values < 1.0 mean compression helped.
pub fn compression_ratio(original_len: usize, stored_len: usize) -> f64 {
    if original_len == 0 {
        return 1.0;
    }
    stored_len as f64 / original_len as f64
}
