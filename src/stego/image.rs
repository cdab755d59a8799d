//! Conversion between picture files and [`PixelBuffer`]s.
//!
//! Carriers are decoded with the `image` crate. Grayscale, grayscale+alpha,
//! RGB and RGBA layouts are kept as 1, 2, 3 and 4 channels; anything else
//! (16-bit, float) is converted to 8-bit RGB or RGBA. Output is always PNG
//! since a lossy format would destroy the hidden bits.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{
    ColorType, DynamicImage, GrayAlphaImage, GrayImage, ImageFormat, RgbImage, RgbaImage,
};
use std::io::Cursor;
use std::path::Path;

use super::pixels::PixelBuffer;
use crate::error::StegoError;

/// Prefix of the data URLs produced by [`to_png_data_url`].
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decodes picture bytes (PNG, BMP, JPEG) into a pixel buffer.
pub fn load_from_memory(bytes: &[u8]) -> Result<PixelBuffer, StegoError> {
    if bytes.is_empty() {
        return Err(StegoError::ImageFormatError("empty image".to_string()));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|e| StegoError::ImageFormatError(e.to_string()))?;
    from_dynamic(image)
}

/// Decodes a picture file into a pixel buffer.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<PixelBuffer, StegoError> {
    let image = image::open(path).map_err(|e| StegoError::ImageFormatError(e.to_string()))?;
    from_dynamic(image)
}

/// Decodes a `data:` URL (or bare base64) into a pixel buffer.
pub fn load_from_data_url(url: &str) -> Result<PixelBuffer, StegoError> {
    load_from_memory(&decode_data_url(url)?)
}

/// Extracts the raw bytes of a base64 `data:` URL.
///
/// Bare base64 without the `data:` header is accepted as well.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, StegoError> {
    let url = url.trim();
    let encoded = match url.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest.split_once(',').ok_or_else(|| {
                StegoError::ImageFormatError("data URL has no payload".to_string())
            })?;
            if !header.ends_with(";base64") {
                return Err(StegoError::ImageFormatError(
                    "data URL is not base64-encoded".to_string(),
                ));
            }
            data
        }
        None => url,
    };

    BASE64
        .decode(encoded)
        .map_err(|e| StegoError::ImageFormatError(format!("invalid base64: {}", e)))
}

/// Converts a decoded image into a pixel buffer.
pub fn from_dynamic(image: DynamicImage) -> Result<PixelBuffer, StegoError> {
    let (width, height) = (image.width(), image.height());

    let (channels, samples) = match image.color() {
        ColorType::L8 | ColorType::L16 => (1, image.to_luma8().into_raw()),
        ColorType::La8 | ColorType::La16 => (2, image.to_luma_alpha8().into_raw()),
        ColorType::Rgb8 => (3, image.to_rgb8().into_raw()),
        ColorType::Rgba8 => (4, image.to_rgba8().into_raw()),
        other if other.has_alpha() => (4, image.to_rgba8().into_raw()),
        _ => (3, image.to_rgb8().into_raw()),
    };

    PixelBuffer::new(width, height, channels, samples)
}

/// Converts a pixel buffer into an image of matching layout.
pub fn to_dynamic(buffer: &PixelBuffer) -> Result<DynamicImage, StegoError> {
    let (w, h) = (buffer.width(), buffer.height());
    let raw = buffer.samples().to_vec();
    let mismatch = || StegoError::ImageFormatError("sample count mismatch".to_string());

    let image = match buffer.channels() {
        1 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, raw).ok_or_else(mismatch)?),
        2 => DynamicImage::ImageLumaA8(GrayAlphaImage::from_raw(w, h, raw).ok_or_else(mismatch)?),
        3 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, raw).ok_or_else(mismatch)?),
        4 => DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, raw).ok_or_else(mismatch)?),
        n => {
            return Err(StegoError::ImageFormatError(format!(
                "unsupported channel count {}",
                n
            )))
        }
    };
    Ok(image)
}

/// Encodes a pixel buffer as PNG bytes.
pub fn to_png_bytes(buffer: &PixelBuffer) -> Result<Vec<u8>, StegoError> {
    let mut bytes = Vec::new();
    to_dynamic(buffer)?
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| StegoError::ImageFormatError(e.to_string()))?;
    Ok(bytes)
}

/// Encodes a pixel buffer as a PNG `data:` URL.
pub fn to_png_data_url(buffer: &PixelBuffer) -> Result<String, StegoError> {
    let png = to_png_bytes(buffer)?;
    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, BASE64.encode(png)))
}

/// Saves a pixel buffer as a PNG file.
pub fn save_png<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<(), StegoError> {
    to_dynamic(buffer)?
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| StegoError::ImageFormatError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 17) % 256) as u8,
                ((y * 23) % 256) as u8,
                (((x + y) * 31) % 256) as u8,
            ])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_rgb_layout_preserved() {
        let buffer = from_dynamic(create_test_image(10, 7)).unwrap();

        assert_eq!(buffer.channels(), 3);
        assert_eq!(buffer.width(), 10);
        assert_eq!(buffer.height(), 7);
        assert_eq!(buffer.sample(3, 2, 0), Some(51));
        assert_eq!(buffer.sample(3, 2, 1), Some(46));
    }

    #[test]
    fn test_png_roundtrip_is_lossless() {
        for channels in 1..=4u8 {
            let buffer =
                PixelBuffer::from_fn(9, 5, channels, |x, y, c| (x * 29 + y * 7 + c as u32 * 3) as u8)
                    .unwrap();

            let png = to_png_bytes(&buffer).unwrap();
            let decoded = load_from_memory(&png).unwrap();

            assert_eq!(decoded, buffer);
        }
    }

    #[test]
    fn test_data_url_roundtrip() {
        let buffer = from_dynamic(create_test_image(16, 16)).unwrap();
        let url = to_png_data_url(&buffer).unwrap();

        assert!(url.starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(load_from_data_url(&url).unwrap(), buffer);
    }

    #[test]
    fn test_bare_base64_accepted() {
        let buffer = from_dynamic(create_test_image(4, 4)).unwrap();
        let encoded = BASE64.encode(to_png_bytes(&buffer).unwrap());

        assert_eq!(load_from_data_url(&encoded).unwrap(), buffer);
    }

    #[test]
    fn test_invalid_inputs_are_format_errors() {
        assert!(matches!(
            load_from_memory(b"definitely not an image"),
            Err(StegoError::ImageFormatError(_))
        ));
        assert!(matches!(
            load_from_memory(b""),
            Err(StegoError::ImageFormatError(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/png,plain"),
            Err(StegoError::ImageFormatError(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64"),
            Err(StegoError::ImageFormatError(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,@@@"),
            Err(StegoError::ImageFormatError(_))
        ));
    }

    #[test]
    fn test_save_png_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carrier.png");
        let buffer = from_dynamic(create_test_image(12, 12)).unwrap();

        save_png(&buffer, &path).unwrap();
        assert_eq!(load_from_file(&path).unwrap(), buffer);
    }
}
