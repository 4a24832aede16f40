//! Size-budgeted JPEG compression.
//!
//! Drives a rendered crop towards a byte budget while capping its largest
//! side, in the manner of browser-side image compressors:
//!
//! 1. Downscale to fit `max_dimension` (aspect preserved)
//! 2. Encode at the initial quality; if over budget, binary-search the
//!    highest quality that fits
//! 3. If even the lowest quality is over budget, shrink by 10% and retry,
//!    up to `MAX_ITERATIONS` rounds
//!
//! The search is deterministic, and the output is never larger than the
//! input: when re-encoding cannot beat the input and the input already fits
//! the dimension cap, the input bytes are returned unchanged.
//!
//! Everything here is synchronous and CPU bound; hosts run it off the UI
//! thread (a Web Worker in the browser).

use image::ImageFormat;
use thiserror::Error;

use crate::config::CropperConfig;
use crate::decode::{decode_image, resize, resize_to_fit, DecodeError, DecodedImage};
use crate::encode::{encode_image, EncodeError, JPEG_MIME};

/// Quality of the first attempt.
pub const INITIAL_QUALITY: u8 = 92;
/// Lowest quality the search will try.
pub const MIN_QUALITY: u8 = 10;
/// Maximum shrink rounds.
pub const MAX_ITERATIONS: u32 = 10;

const SHRINK_FACTOR: f64 = 0.9;

/// Errors from compressing a rendered crop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompressionError {
    #[error("Cannot read image for compression: {0}")]
    Unreadable(#[from] DecodeError),

    #[error("Compression encode failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Invalid compression limits: {max_size_bytes} bytes, {max_dimension}px")]
    InvalidLimits {
        max_size_bytes: u64,
        max_dimension: u32,
    },
}

/// Limits for one compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    pub max_size_bytes: u64,
    pub max_dimension: u32,
}

impl CompressionOptions {
    pub fn new(max_size_bytes: u64, max_dimension: u32) -> Self {
        Self {
            max_size_bytes,
            max_dimension,
        }
    }

    pub fn from_config(config: &CropperConfig) -> Self {
        Self::new(config.max_size_bytes(), config.max_dimension())
    }
}

/// Compressed output handed back to the upload control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedFile {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
}

impl CompressedFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// One encode attempt.
struct Attempt {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

/// Tracks the smallest encode seen so the best effort survives a search
/// that never meets the budget.
#[derive(Default)]
struct Smallest(Option<Attempt>);

impl Smallest {
    fn offer(&mut self, bytes: &[u8], image: &DecodedImage) {
        let smaller = self
            .0
            .as_ref()
            .map_or(true, |best| bytes.len() < best.bytes.len());
        if smaller {
            self.0 = Some(Attempt {
                bytes: bytes.to_vec(),
                width: image.width,
                height: image.height,
            });
        }
    }
}

/// Compress encoded image bytes to the given limits.
pub fn compress_image(
    input: &[u8],
    options: &CompressionOptions,
) -> Result<CompressedFile, CompressionError> {
    if options.max_size_bytes == 0 || options.max_dimension == 0 {
        return Err(CompressionError::InvalidLimits {
            max_size_bytes: options.max_size_bytes,
            max_dimension: options.max_dimension,
        });
    }

    let decoded = decode_image(input)?;
    let fits_dimension = decoded.max_dimension() <= options.max_dimension;

    if fits_dimension && input.len() as u64 <= options.max_size_bytes {
        log::debug!(
            "input already within limits ({} bytes), passing through",
            input.len()
        );
        return Ok(passthrough(input, &decoded));
    }

    // Aim below the input size too, so re-encoding never grows the file
    let budget = options.max_size_bytes.min(input.len() as u64);
    let mut image = resize_to_fit(&decoded, options.max_dimension)?;
    let mut smallest = Smallest::default();
    let mut within_budget = None;

    for iteration in 0..MAX_ITERATIONS {
        if let Some(bytes) = search_quality(&image, budget, &mut smallest)? {
            log::debug!(
                "compressed to {} bytes at {}x{} after {} shrink round(s)",
                bytes.len(),
                image.width,
                image.height,
                iteration
            );
            within_budget = Some(Attempt {
                bytes,
                width: image.width,
                height: image.height,
            });
            break;
        }

        if image.width <= 1 && image.height <= 1 {
            break;
        }
        let width = ((image.width as f64 * SHRINK_FACTOR).floor() as u32).max(1);
        let height = ((image.height as f64 * SHRINK_FACTOR).floor() as u32).max(1);
        image = resize(&image, width, height)?;
    }

    let attempt = match within_budget.or(smallest.0) {
        Some(attempt) => attempt,
        None => return Ok(passthrough(input, &decoded)),
    };

    if fits_dimension && attempt.bytes.len() >= input.len() {
        log::debug!("re-encode did not shrink input, keeping original bytes");
        return Ok(passthrough(input, &decoded));
    }

    if attempt.bytes.len() as u64 > options.max_size_bytes {
        log::warn!(
            "could not reach {} byte budget, best effort is {} bytes",
            options.max_size_bytes,
            attempt.bytes.len()
        );
    }

    Ok(CompressedFile {
        bytes: attempt.bytes,
        mime_type: JPEG_MIME.to_string(),
        width: attempt.width,
        height: attempt.height,
    })
}

/// Compress using the limits of a cropper configuration.
pub fn compress_for_config(
    input: &[u8],
    config: &CropperConfig,
) -> Result<CompressedFile, CompressionError> {
    compress_image(input, &CompressionOptions::from_config(config))
}

/// Highest quality encode within budget at the current size, if any.
fn search_quality(
    image: &DecodedImage,
    budget: u64,
    smallest: &mut Smallest,
) -> Result<Option<Vec<u8>>, CompressionError> {
    let first = encode_image(image, INITIAL_QUALITY)?;
    smallest.offer(&first, image);
    if first.len() as u64 <= budget {
        return Ok(Some(first));
    }

    let (mut lo, mut hi) = (MIN_QUALITY, INITIAL_QUALITY - 1);
    let mut best = None;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let bytes = encode_image(image, mid)?;
        smallest.offer(&bytes, image);
        if bytes.len() as u64 <= budget {
            best = Some(bytes);
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }

    Ok(best)
}

fn passthrough(input: &[u8], decoded: &DecodedImage) -> CompressedFile {
    let mime_type = match image::guess_format(input) {
        Ok(ImageFormat::Png) => "image/png",
        _ => JPEG_MIME,
    };
    CompressedFile {
        bytes: input.to_vec(),
        mime_type: mime_type.to_string(),
        width: decoded.width,
        height: decoded.height,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::test_helpers::{gradient_image, jpeg_bytes};
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Property: Output never expands and always respects the dimension cap.
        #[test]
        fn prop_never_expands_and_fits_dimension(
            (width, height) in (16u32..=64, 16u32..=64),
            quality in 70u8..=100,
            max_dimension in 8u32..=80,
            budget in 200u64..=20_000,
        ) {
            let input = jpeg_bytes(&gradient_image(width, height), quality);
            let out = compress_image(&input, &CompressionOptions::new(budget, max_dimension)).unwrap();

            prop_assert!(out.size() <= input.len() as u64, "{} > {}", out.size(), input.len());
            prop_assert!(out.width.max(out.height) <= max_dimension);
            prop_assert!(out.width.max(out.height) <= width.max(height));
        }
    }
}
