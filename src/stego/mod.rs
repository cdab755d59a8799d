//! Steganography module for hiding data in raster images.
//!
//! Supports:
//! - Capacity computation for any geometry and bit depth
//! - LSB embedding and extraction at 1 to 8 bits per channel sample
//! - Conversion between PNG/BMP/JPEG carriers and pixel buffers

pub mod capacity;
pub mod image;
pub mod lsb;
pub mod pixels;

pub use capacity::{capacity, CapacityResult, FRAME_OVERHEAD_BYTES};
pub use lsb::{embed, extract, LsbReader, LsbWriter};
pub use pixels::{BitDepth, PixelBuffer};
