//! Message decoding from a carrier image.
//!
//! This module orchestrates the decoding process:
//! 1. Read the unencrypted salt + nonce prefix
//! 2. Re-derive the key from the password
//! 3. Read and decrypt the fixed frame header, check magic and flags
//! 4. Read and decrypt exactly `payload_length` bytes
//! 5. Verify the CRC-32 and inflate when the payload was compressed
//!
//! Decoding is all-or-nothing: either the exact original message comes
//! back or an error does. Wrong password, wrong bit depth and a carrier
//! without hidden data all surface as a decode failure
//! (see [`StegoError::is_decode_failure`]).

use tracing::debug;

use crate::crypto::{EncryptionContext, KdfParams, PREFIX_LEN};
use crate::error::StegoError;
use crate::frame::{Frame, FrameHeader, Payload, HEADER_LEN};
use crate::stego::{BitDepth, LsbReader, PixelBuffer};

/// Configuration for the decoder.
///
/// Must match the settings the image was encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    /// Low-order bits used per channel sample.
    pub bit_depth: BitDepth,
    /// Argon2id cost parameters.
    pub kdf: KdfParams,
}

/// Recovers the message hidden in `buffer`.
pub fn decode(
    buffer: &PixelBuffer,
    password: &str,
    config: &DecoderConfig,
) -> Result<Vec<u8>, StegoError> {
    decode_payload(buffer, password, config).map(|payload| payload.bytes)
}

/// Recovers the hidden payload together with its compression flag.
pub fn decode_payload(
    buffer: &PixelBuffer,
    password: &str,
    config: &DecoderConfig,
) -> Result<Payload, StegoError> {
    if password.is_empty() {
        return Err(StegoError::invalid("password must not be empty"));
    }

    let mut reader = LsbReader::new(buffer.samples(), config.bit_depth);

    // A carrier too small for the envelope cannot hold a message
    let mut prefix = [0u8; PREFIX_LEN];
    reader
        .read_into(&mut prefix)
        .map_err(|_| StegoError::CorruptFrame)?;

    let context = EncryptionContext::from_prefix(password, &prefix, &config.kdf)?;
    let mut keystream = context.keystream();

    let mut header = [0u8; HEADER_LEN];
    reader
        .read_into(&mut header)
        .map_err(|_| StegoError::CorruptFrame)?;
    keystream.apply(&mut header);
    let header = FrameHeader::parse(&header)?;

    let payload_len = header.payload_length as usize;
    if payload_len > reader.remaining_bytes() {
        return Err(StegoError::CorruptFrame);
    }

    let mut stored = reader.read_bytes(payload_len)?;
    keystream.apply(&mut stored);

    let payload = Frame::open(header, stored)?.into_payload()?;

    debug!(
        stored = payload_len,
        message_len = payload.bytes.len(),
        bit_depth = config.bit_depth.get(),
        compressed = payload.compressed,
        "decoded message"
    );

    Ok(payload)
}
