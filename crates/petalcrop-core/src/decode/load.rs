//! JPEG/PNG decoding with EXIF orientation handling.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageReader};

use super::{DecodeError, DecodedImage};

/// Decode a JPEG or PNG image from bytes, applying EXIF orientation.
///
/// Browsers honour EXIF orientation when an image element is drawn onto a
/// canvas, so crop regions chosen in the preview are expressed in the
/// oriented pixel space. Decoding here matches that.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the bytes are not JPEG or PNG.
/// Returns `DecodeError::CorruptedFile` if decoding fails part way.
/// Returns `DecodeError::EmptyImage` for a zero-sized image.
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        _ => return Err(DecodeError::InvalidFormat),
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let oriented = orient(img, exif_orientation(bytes));
    let decoded = if oriented.color().has_alpha() {
        flatten_onto_black(oriented.into_rgba8())
    } else {
        DecodedImage::from_rgb_image(oriented.into_rgb8())
    };
    if decoded.is_empty() {
        return Err(DecodeError::EmptyImage);
    }

    log::debug!("decoded source image {}x{}", decoded.width, decoded.height);
    Ok(decoded)
}

/// EXIF orientation tag (1-8) of a JPEG, or 1 when there is none.
pub fn exif_orientation(bytes: &[u8]) -> u32 {
    Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .filter(|tag| (1..=8).contains(tag))
        .unwrap_or(1)
}

/// Turn stored pixels upright for an EXIF orientation tag.
fn orient(img: DynamicImage, tag: u32) -> DynamicImage {
    match tag {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Composite onto black, as a canvas does when exported as JPEG.
fn flatten_onto_black(img: image::RgbaImage) -> DecodedImage {
    let (width, height) = img.dimensions();
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 3);
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        let alpha = u16::from(a);
        pixels.extend([r, g, b].map(|c| ((u16::from(c) * alpha + 127) / 255) as u8));
    }
    DecodedImage::new(width, height, pixels)
}
