//! Bitstream framing for hidden payloads.
//!
//! The frame is the self-describing container that wraps a payload before
//! encryption and embedding:
//!
//! ```text
//! [4 bytes ] magic b"SGS1"
//! [4 bytes ] payload length (big-endian u32)
//! [4 bytes ] CRC-32 of the stored payload bytes (big-endian u32)
//! [1 byte  ] flags (bit 0 = compressed, other bits reserved as zero)
//! [N bytes ] payload bytes, DEFLATE-compressed when flagged
//! ```
//!
//! The checksum covers the stored bytes, so a decoder verifies integrity
//! before it tries to inflate anything.

pub mod compression;

use tracing::debug;

use crate::error::StegoError;

/// Frame marker. Under encryption it doubles as the password check.
pub const MAGIC: [u8; 4] = *b"SGS1";

/// Size of the fixed frame header in bytes.
pub const HEADER_LEN: usize = 4 + 4 + 4 + 1;

/// Flag bit marking a compressed payload.
const FLAG_COMPRESSED: u8 = 0x01;

/// Decoded payload plus the flag saying how it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Original message bytes (already inflated).
    pub bytes: Vec<u8>,
    /// Whether the bytes travelled compressed.
    pub compressed: bool,
}

/// Parsed fixed-size frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Number of stored payload bytes following the header.
    pub payload_length: u32,
    /// CRC-32 of the stored payload bytes.
    pub checksum: u32,
    /// Whether the stored payload is DEFLATE-compressed.
    pub compressed: bool,
}

impl FrameHeader {
    /// Parses and validates a header.
    ///
    /// Fails with [`StegoError::CorruptFrame`] when the magic does not match
    /// or a reserved flag bit is set.
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, StegoError> {
        if bytes[..4] != MAGIC {
            return Err(StegoError::CorruptFrame);
        }

        let payload_length = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let checksum = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let flags = bytes[12];

        if flags & !FLAG_COMPRESSED != 0 {
            return Err(StegoError::CorruptFrame);
        }

        Ok(Self {
            payload_length,
            checksum,
            compressed: flags & FLAG_COMPRESSED != 0,
        })
    }

    /// Serializes the header into its wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&MAGIC);
        out[4..8].copy_from_slice(&self.payload_length.to_be_bytes());
        out[8..12].copy_from_slice(&self.checksum.to_be_bytes());
        out[12] = if self.compressed { FLAG_COMPRESSED } else { 0 };
        out
    }
}

/// A framed payload ready for encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    stored: Vec<u8>,
}

impl Frame {
    /// Returns the frame header.
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Returns the stored (possibly compressed) payload bytes.
    pub fn stored_bytes(&self) -> &[u8] {
        &self.stored
    }

    /// Total framed length in bytes (header plus stored payload).
    pub fn len(&self) -> usize {
        HEADER_LEN + self.stored.len()
    }

    /// Returns true when the frame carries no payload bytes.
    pub fn is_empty(&self) -> bool {
        self.stored.is_empty()
    }

    /// Serializes the frame into its wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.stored);
        out
    }

    /// Rebuilds a frame from a parsed header and exactly
    /// `header.payload_length` stored bytes, verifying the checksum.
    pub fn open(header: FrameHeader, stored: Vec<u8>) -> Result<Self, StegoError> {
        if stored.len() != header.payload_length as usize {
            return Err(StegoError::CorruptFrame);
        }
        if crc32fast::hash(&stored) != header.checksum {
            return Err(StegoError::ChecksumMismatch);
        }
        Ok(Self { header, stored })
    }

    /// Consumes the frame and returns the original payload, inflating it
    /// when the compressed flag is set.
    pub fn into_payload(self) -> Result<Payload, StegoError> {
        let compressed = self.header.compressed;
        let bytes = if compressed {
            compression::decompress(&self.stored)?
        } else {
            self.stored
        };
        Ok(Payload { bytes, compressed })
    }
}

/// Frames a payload, optionally compressing it first.
///
/// When compression does not shrink the payload the raw bytes are stored
/// and the compressed flag is left clear.
pub fn frame(payload: &[u8], compress: bool) -> Result<Frame, StegoError> {
    let compressed = if compress {
        compression::compress(payload)?
    } else {
        None
    };

    let (stored, is_compressed) = match compressed {
        Some(bytes) => (bytes, true),
        None => (payload.to_vec(), false),
    };

    let payload_length = u32::try_from(stored.len())
        .map_err(|_| StegoError::invalid("payload exceeds 4 GiB"))?;

    debug!(
        original = payload.len(),
        stored = stored.len(),
        compressed = is_compressed,
        "framed payload"
    );

    Ok(Frame {
        header: FrameHeader {
            payload_length,
            checksum: crc32fast::hash(&stored),
            compressed: is_compressed,
        },
        stored,
    })
}

/// Parses a complete frame from `bytes` and returns its payload.
///
/// Trailing bytes after the declared payload are ignored.
pub fn unframe(bytes: &[u8]) -> Result<Payload, StegoError> {
    let header_bytes: &[u8; HEADER_LEN] = bytes
        .get(..HEADER_LEN)
        .and_then(|h| h.try_into().ok())
        .ok_or(StegoError::CorruptFrame)?;
    let header = FrameHeader::parse(header_bytes)?;

    let end = HEADER_LEN
        .checked_add(header.payload_length as usize)
        .ok_or(StegoError::CorruptFrame)?;
    let stored = bytes.get(HEADER_LEN..end).ok_or(StegoError::CorruptFrame)?;

    Frame::open(header, stored.to_vec())?.into_payload()
}
