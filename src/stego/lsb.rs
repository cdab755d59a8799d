//! LSB (Least Significant Bit) embedding and extraction.
//!
//! Stream bit `b` is stored in sample `b / d` at bit plane `b % d`, where
//! `d` is the bit depth and plane 0 is the least significant bit. Samples
//! are visited in buffer order (row-major pixels, channels as stored).
//! Bytes enter the stream LSB-first: stream bit `8 * i + k` is bit `k` of
//! byte `i`.

use super::pixels::{BitDepth, PixelBuffer};
use crate::error::StegoError;

/// Sequential writer over a mutable sample slice.
pub struct LsbWriter<'a> {
    samples: &'a mut [u8],
    depth: BitDepth,
    bit_pos: u64,
}

impl<'a> LsbWriter<'a> {
    /// Starts writing at the first bit of the first sample.
    pub fn new(samples: &'a mut [u8], depth: BitDepth) -> Self {
        Self {
            samples,
            depth,
            bit_pos: 0,
        }
    }

    /// Bits that can still be written.
    pub fn remaining_bits(&self) -> u64 {
        total_bits(self.samples.len(), self.depth).saturating_sub(self.bit_pos)
    }

    /// Writes whole bytes, LSB-first.
    ///
    /// Nothing is written when the bytes do not fit.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), StegoError> {
        let needed = data.len() as u64 * 8;
        self.ensure_room(needed)?;

        for &byte in data {
            for k in 0..8 {
                self.put_bit((byte >> k) & 1);
            }
        }
        Ok(())
    }

    /// Writes individual bits.
    ///
    /// Nothing is written when the bits do not fit.
    pub fn write_bits(&mut self, bits: &[bool]) -> Result<(), StegoError> {
        self.ensure_room(bits.len() as u64)?;

        for &bit in bits {
            self.put_bit(bit as u8);
        }
        Ok(())
    }

    fn ensure_room(&self, needed_bits: u64) -> Result<(), StegoError> {
        let remaining = self.remaining_bits();
        if needed_bits > remaining {
            return Err(StegoError::CapacityExceeded {
                needed: bits_to_bytes(needed_bits),
                capacity: (remaining / 8) as usize,
            });
        }
        Ok(())
    }

    fn put_bit(&mut self, bit: u8) {
        let depth = self.depth.get() as u64;
        let sample = (self.bit_pos / depth) as usize;
        let plane = (self.bit_pos % depth) as u32;

        // Clear the plane and set the new bit
        let slot = &mut self.samples[sample];
        *slot = (*slot & !(1u8 << plane)) | ((bit & 1) << plane);
        self.bit_pos += 1;
    }
}

/// Sequential reader over a sample slice.
pub struct LsbReader<'a> {
    samples: &'a [u8],
    depth: BitDepth,
    bit_pos: u64,
}

impl<'a> LsbReader<'a> {
    /// Starts reading at the first bit of the first sample.
    pub fn new(samples: &'a [u8], depth: BitDepth) -> Self {
        Self {
            samples,
            depth,
            bit_pos: 0,
        }
    }

    /// Bits that can still be read.
    pub fn remaining_bits(&self) -> u64 {
        total_bits(self.samples.len(), self.depth).saturating_sub(self.bit_pos)
    }

    /// Whole bytes that can still be read.
    pub fn remaining_bytes(&self) -> usize {
        (self.remaining_bits() / 8) as usize
    }

    /// Reads `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, StegoError> {
        let mut out = vec![0u8; len];
        self.read_into(&mut out)?;
        Ok(out)
    }

    /// Fills `out` with the next bytes of the stream.
    pub fn read_into(&mut self, out: &mut [u8]) -> Result<(), StegoError> {
        self.ensure_available(out.len() as u64 * 8)?;

        for byte in out.iter_mut() {
            let mut value = 0u8;
            for k in 0..8 {
                value |= self.take_bit() << k;
            }
            *byte = value;
        }
        Ok(())
    }

    /// Reads `count` individual bits.
    pub fn read_bits(&mut self, count: usize) -> Result<Vec<bool>, StegoError> {
        self.ensure_available(count as u64)?;
        Ok((0..count).map(|_| self.take_bit() == 1).collect())
    }

    fn ensure_available(&self, needed_bits: u64) -> Result<(), StegoError> {
        let remaining = self.remaining_bits();
        if needed_bits > remaining {
            return Err(StegoError::CapacityExceeded {
                needed: bits_to_bytes(needed_bits),
                capacity: (remaining / 8) as usize,
            });
        }
        Ok(())
    }

    fn take_bit(&mut self) -> u8 {
        let depth = self.depth.get() as u64;
        let sample = (self.bit_pos / depth) as usize;
        let plane = (self.bit_pos % depth) as u32;

        self.bit_pos += 1;
        (self.samples[sample] >> plane) & 1
    }
}

/// Hides `data` in a copy of `buffer`.
///
/// Fails with [`StegoError::CapacityExceeded`] before copying anything when
/// the data does not fit. Bits above plane `depth - 1` and samples past the
/// end of the data are left untouched.
pub fn embed(buffer: &PixelBuffer, data: &[u8], depth: BitDepth) -> Result<PixelBuffer, StegoError> {
    check_fits(buffer, data.len() as u64 * 8, depth)?;

    let mut output = buffer.clone();
    LsbWriter::new(output.samples_mut(), depth).write_bytes(data)?;
    Ok(output)
}

/// Reads `len` bytes hidden at the start of `buffer`.
pub fn extract(buffer: &PixelBuffer, depth: BitDepth, len: usize) -> Result<Vec<u8>, StegoError> {
    LsbReader::new(buffer.samples(), depth).read_bytes(len)
}

/// Hides an arbitrary bit sequence in a copy of `buffer`.
pub fn embed_bits(
    buffer: &PixelBuffer,
    bits: &[bool],
    depth: BitDepth,
) -> Result<PixelBuffer, StegoError> {
    check_fits(buffer, bits.len() as u64, depth)?;

    let mut output = buffer.clone();
    LsbWriter::new(output.samples_mut(), depth).write_bits(bits)?;
    Ok(output)
}

/// Reads `count` bits hidden at the start of `buffer`.
pub fn extract_bits(
    buffer: &PixelBuffer,
    depth: BitDepth,
    count: usize,
) -> Result<Vec<bool>, StegoError> {
    LsbReader::new(buffer.samples(), depth).read_bits(count)
}

fn check_fits(buffer: &PixelBuffer, needed_bits: u64, depth: BitDepth) -> Result<(), StegoError> {
    let available = total_bits(buffer.samples().len(), depth);
    if needed_bits > available {
        return Err(StegoError::CapacityExceeded {
            needed: bits_to_bytes(needed_bits),
            capacity: (available / 8) as usize,
        });
    }
    Ok(())
}

fn total_bits(samples: usize, depth: BitDepth) -> u64 {
    samples as u64 * depth.get() as u64
}

fn bits_to_bytes(bits: u64) -> usize {
    bits.div_ceil(8) as usize
}
