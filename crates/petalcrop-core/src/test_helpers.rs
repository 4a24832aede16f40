//! Shared fixtures for unit tests.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::decode::DecodedImage;
use crate::encode::encode_image;

/// Image with a horizontal red ramp, vertical green ramp and a textured
/// blue channel so JPEG sizes respond to quality.
pub fn gradient_image(width: u32, height: u32) -> DecodedImage {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push(((x * 255) / width.max(1)) as u8);
            pixels.push(((y * 255) / height.max(1)) as u8);
            pixels.push(((x * 37 + y * 91) % 256) as u8);
        }
    }
    DecodedImage::new(width, height, pixels)
}

/// Image filled with a single colour.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DecodedImage {
    let pixels = rgb
        .iter()
        .copied()
        .cycle()
        .take((width * height * 3) as usize)
        .collect();
    DecodedImage::new(width, height, pixels)
}

pub fn png_bytes(image: &DecodedImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgb8,
        )
        .expect("png encode");
    buffer.into_inner()
}

/// PNG with an alpha channel, every pixel `rgba`.
pub fn rgba_png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let pixels: Vec<u8> = rgba
        .iter()
        .copied()
        .cycle()
        .take((width * height * 4) as usize)
        .collect();
    let mut buffer = Cursor::new(Vec::new());
    PngEncoder::new(&mut buffer)
        .write_image(&pixels, width, height, ExtendedColorType::Rgba8)
        .expect("png encode");
    buffer.into_inner()
}

pub fn jpeg_bytes(image: &DecodedImage, quality: u8) -> Vec<u8> {
    encode_image(image, quality).expect("jpeg encode")
}
