//! In-memory pixel buffers and embedding bit depth.

use std::fmt;

use crate::error::StegoError;

/// Highest supported channel count (RGBA).
pub const MAX_CHANNELS: u8 = 4;

/// Number of low-order bits per channel sample used for embedding.
///
/// Always in `1..=8`; larger values hold more data and are easier to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitDepth(u8);

impl BitDepth {
    /// Smallest bit depth.
    pub const MIN: u8 = 1;
    /// Largest bit depth.
    pub const MAX: u8 = 8;

    /// Validates and wraps a bit depth.
    pub fn new(bits: u8) -> Result<Self, StegoError> {
        if (Self::MIN..=Self::MAX).contains(&bits) {
            Ok(Self(bits))
        } else {
            Err(StegoError::invalid(format!(
                "bit depth must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                bits
            )))
        }
    }

    /// Parses a bit depth from a wider integer (e.g. a request field).
    pub fn from_i64(bits: i64) -> Result<Self, StegoError> {
        u8::try_from(bits)
            .map_err(|_| StegoError::invalid(format!("bit depth out of range: {}", bits)))
            .and_then(Self::new)
    }

    /// Returns the number of bits.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for BitDepth {
    fn default() -> Self {
        Self(2)
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = StegoError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An owned image as a flat sequence of 8-bit channel samples.
///
/// Samples are stored row-major with interleaved channels, so the sample
/// for pixel `(x, y)` and channel `c` lives at `(y * width + x) * channels + c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a buffer, checking that the sample count matches the geometry.
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> Result<Self, StegoError> {
        let expected = sample_count(width, height, channels)?;
        if samples.len() as u64 != expected {
            return Err(StegoError::invalid(format!(
                "expected {} samples for {}x{}x{}, got {}",
                expected,
                width,
                height,
                channels,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Creates a buffer with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Result<Self, StegoError> {
        let len = sample_count(width, height, channels)?;
        let len = usize::try_from(len).map_err(|_| StegoError::invalid("image too large"))?;
        Self::new(width, height, channels, vec![value; len])
    }

    /// Creates a buffer by evaluating `f(x, y, channel)` for every sample.
    pub fn from_fn<F>(width: u32, height: u32, channels: u8, mut f: F) -> Result<Self, StegoError>
    where
        F: FnMut(u32, u32, u8) -> u8,
    {
        let len = sample_count(width, height, channels)?;
        let mut samples = Vec::with_capacity(len as usize);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    samples.push(f(x, y, c));
                }
            }
        }
        Self::new(width, height, channels, samples)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// All samples in storage order.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Mutable access to the samples. The length cannot change.
    pub fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    /// Returns one sample.
    pub fn sample(&self, x: u32, y: u32, channel: u8) -> Option<u8> {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * self.channels as usize
            + channel as usize;
        self.samples.get(idx).copied()
    }

    /// Iterates the samples of one channel in row-major order.
    pub fn channel_samples(&self, channel: u8) -> impl Iterator<Item = u8> + '_ {
        self.samples
            .iter()
            .skip(channel as usize)
            .step_by(self.channels.max(1) as usize)
            .copied()
    }

    /// Returns one row of interleaved samples.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * self.channels as usize;
        let start = y as usize * stride;
        &self.samples[start..start + stride]
    }
}

fn sample_count(width: u32, height: u32, channels: u8) -> Result<u64, StegoError> {
    if width == 0 || height == 0 {
        return Err(StegoError::invalid("image geometry must be non-zero"));
    }
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(StegoError::invalid(format!(
            "channel count must be between 1 and {}, got {}",
            MAX_CHANNELS, channels
        )));
    }
    Ok(width as u64 * height as u64 * channels as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_depth_range() {
        assert!(BitDepth::new(0).is_err());
        assert!(BitDepth::new(9).is_err());
        for bits in 1..=8 {
            assert_eq!(BitDepth::new(bits).unwrap().get(), bits);
        }
        assert_eq!(BitDepth::default().get(), 2);
    }

    #[test]
    fn test_bit_depth_from_wide_integer() {
        assert!(BitDepth::from_i64(-1).is_err());
        assert!(BitDepth::from_i64(300).is_err());
        assert_eq!(BitDepth::from_i64(3).unwrap().get(), 3);
    }

    #[test]
    fn test_buffer_length_invariant() {
        assert!(PixelBuffer::new(2, 2, 3, vec![0; 12]).is_ok());
        assert!(matches!(
            PixelBuffer::new(2, 2, 3, vec![0; 11]),
            Err(StegoError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_geometry_rejected() {
        assert!(PixelBuffer::new(0, 2, 3, vec![]).is_err());
        assert!(PixelBuffer::new(2, 0, 3, vec![]).is_err());
        assert!(PixelBuffer::new(1, 1, 0, vec![]).is_err());
        assert!(PixelBuffer::new(1, 1, 5, vec![0; 5]).is_err());
    }

    #[test]
    fn test_sample_addressing() {
        let buffer = PixelBuffer::from_fn(4, 3, 3, |x, y, c| (x * 100 + y * 10 + c as u32) as u8)
            .unwrap();

        assert_eq!(buffer.sample(2, 1, 1), Some(211));
        assert_eq!(buffer.sample(4, 0, 0), None);
        assert_eq!(buffer.row(1).len(), 12);
        assert_eq!(buffer.row(1)[0], 10);

        let green: Vec<u8> = buffer.channel_samples(1).take(3).collect();
        assert_eq!(green, vec![1, 101, 201]);
    }
}
