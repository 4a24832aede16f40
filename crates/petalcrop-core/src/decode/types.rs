//! Pixel buffer and error types shared by the pipeline.

use thiserror::Error;

/// Why a source or intermediate image could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not a JPEG or PNG.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// Decoder gave up part way (truncated or damaged file).
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    #[error("Image has zero width or height")]
    EmptyImage,
}

/// Packed 8-bit RGB pixels, row-major, no padding.
///
/// Alpha never survives decoding: transparent pixels are composited onto
/// black, matching a canvas exported as JPEG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 3,
            "RGB buffer does not match {}x{}",
            width,
            height
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// All-black raster, the starting state of a canvas.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(width, height, vec![0u8; (width as usize) * (height as usize) * 3])
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    /// Copy into an `image` buffer; `None` if the buffer length is off.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Longest side in pixels.
    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_black() {
        let img = DecodedImage::blank(40, 30);
        assert_eq!(img.pixels.len(), 40 * 30 * 3);
        assert_eq!(img.max_dimension(), 40);
        assert!(img.pixels.iter().all(|&p| p == 0));
        assert!(!img.is_empty());
    }

    #[test]
    fn test_zero_sized_is_empty() {
        assert!(DecodedImage::new(0, 0, vec![]).is_empty());
    }

    #[test]
    fn test_rgb_image_conversion_keeps_pixels() {
        let pixels: Vec<u8> = (0..2 * 2 * 3).map(|i| i as u8 * 10).collect();
        let img = DecodedImage::new(2, 2, pixels.clone());
        let rgb = img.to_rgb_image().unwrap();
        assert_eq!(DecodedImage::from_rgb_image(rgb).pixels, pixels);
    }

    #[test]
    fn test_mismatched_buffer_has_no_rgb_image() {
        let img = DecodedImage {
            width: 4,
            height: 4,
            pixels: vec![0; 5],
        };
        assert!(img.to_rgb_image().is_none());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DecodeError::CorruptedFile("unexpected EOF".to_string()).to_string(),
            "Corrupted or incomplete image file: unexpected EOF"
        );
        assert_eq!(
            DecodeError::InvalidFormat.to_string(),
            "Invalid or unsupported image format"
        );
    }
}
