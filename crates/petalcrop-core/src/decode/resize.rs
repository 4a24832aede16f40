//! Lanczos3 scaling for the compressor. Inputs are never modified.

use image::imageops::{self, FilterType};

use super::{DecodeError, DecodedImage};

/// Scale to exactly `width` x `height`.
pub fn resize(
    image: &DecodedImage,
    width: u32,
    height: u32,
) -> Result<DecodedImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage);
    }
    if (image.width, image.height) == (width, height) {
        return Ok(image.clone());
    }

    let source = image.to_rgb_image().ok_or_else(|| {
        DecodeError::CorruptedFile(format!(
            "{} bytes cannot hold a {}x{} RGB image",
            image.pixels.len(),
            image.width,
            image.height
        ))
    })?;
    let scaled = imageops::resize(&source, width, height, FilterType::Lanczos3);
    Ok(DecodedImage::from_rgb_image(scaled))
}

/// Shrink so neither side exceeds `max_edge`, keeping the aspect ratio.
/// Small images come back as they are.
pub fn resize_to_fit(image: &DecodedImage, max_edge: u32) -> Result<DecodedImage, DecodeError> {
    if max_edge == 0 {
        return Err(DecodeError::EmptyImage);
    }
    if image.max_dimension() <= max_edge {
        return Ok(image.clone());
    }
    let (width, height) = fit_within(image.width, image.height, max_edge);
    resize(image, width, height)
}

/// Longest side becomes `max_edge`; the other is scaled and rounded, but
/// never drops below one pixel.
pub(crate) fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest == 0 {
        return (0, 0);
    }
    let scale = f64::from(max_edge) / f64::from(longest);
    let shrink = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_edge);
    (shrink(width), shrink(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::gradient_image;

    #[test]
    fn test_resize_to_exact_size() {
        let scaled = resize(&gradient_image(100, 50), 50, 25).unwrap();
        assert_eq!((scaled.width, scaled.height), (50, 25));
        assert_eq!(scaled.pixels.len(), 50 * 25 * 3);
    }

    #[test]
    fn test_resize_to_own_size_is_a_copy() {
        let img = gradient_image(30, 20);
        assert_eq!(resize(&img, 30, 20).unwrap(), img);
    }

    #[test]
    fn test_zero_targets_are_errors() {
        let img = gradient_image(100, 50);
        assert_eq!(
            resize(&img, 0, 50),
            Err(DecodeError::EmptyImage)
        );
        assert!(resize(&img, 50, 0).is_err());
        assert!(resize_to_fit(&img, 0).is_err());
    }

    #[test]
    fn test_fit_landscape_and_portrait() {
        let wide = resize_to_fit(&gradient_image(600, 400), 300).unwrap();
        assert_eq!((wide.width, wide.height), (300, 200));

        let tall = resize_to_fit(&gradient_image(400, 600), 256).unwrap();
        assert_eq!((tall.width, tall.height), (171, 256));
    }

    #[test]
    fn test_fit_does_not_upscale() {
        let img = gradient_image(100, 50);
        assert_eq!(resize_to_fit(&img, 400).unwrap(), img);
    }

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within(6000, 4000, 2560), (2560, 1707));
        assert_eq!(fit_within(4000, 6000, 2560), (1707, 2560));
        assert_eq!(fit_within(4000, 4000, 256), (256, 256));
        assert_eq!(fit_within(10000, 1, 400), (400, 1));
        assert_eq!(fit_within(0, 0, 256), (0, 0));
    }
}
