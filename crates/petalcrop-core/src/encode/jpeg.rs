//! Baseline JPEG output through the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

use crate::decode::DecodedImage;

/// MIME type of every artifact this module produces.
pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Cannot encode a {width}x{height} image")]
    InvalidDimensions { width: u32, height: u32 },

    /// Buffer is not `width * height * 3` bytes long.
    #[error("Pixel buffer holds {actual} bytes, {expected} needed")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Encode an RGB raster as JPEG.
///
/// `quality` is clamped to 1-100. Output is a pure function of pixels and
/// quality; the compressor's binary search depends on that.
pub fn encode_image(image: &DecodedImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let DecodedImage {
        width,
        height,
        ref pixels,
    } = *image;
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }

    let mut out = Vec::with_capacity(expected / 8);
    JpegEncoder::new_with_quality(Cursor::new(&mut out), quality.clamp(1, 100))
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    Ok(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_same_pixels_same_bytes(
            width in 1u32..=20,
            height in 1u32..=20,
            quality in 1u8..=100,
            seed in any::<u8>(),
        ) {
            let pixels = (0..width * height * 3)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                .collect();
            let img = DecodedImage::new(width, height, pixels);
            prop_assert_eq!(encode_image(&img, quality), encode_image(&img, quality));
        }
    }
}
