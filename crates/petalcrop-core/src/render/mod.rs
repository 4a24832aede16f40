//! Crop canvas renderer.
//!
//! Turns a source image, a crop region and a rotation into a JPEG of exactly
//! the configured output size:
//!
//! 1. Decode the source (fails before any drawing)
//! 2. Allocate an `output_width × output_height` raster
//! 3. Rotate about the raster centre, then draw the region scaled to fill it
//! 4. Encode as JPEG at quality 95
//!
//! Aspect distortion is allowed; keeping the region's aspect ratio in line
//! with the output is the cropper's job. Round crop shapes are a preview
//! mask only and are not applied here.

mod canvas;
mod region;

use thiserror::Error;

use crate::decode::{decode_image, DecodeError, DecodedImage};
use crate::encode::{encode_image, EncodeError};

pub use canvas::{normalize_degrees, rasterize_crop, CanvasTransform};
pub use region::CropRegion;

/// JPEG quality of the renderer's artifact (`toBlob(.., 0.95)`).
pub const RENDER_QUALITY: u8 = 95;

/// Errors from rendering a crop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("Failed to load image: {0}")]
    Decode(#[from] DecodeError),

    #[error("Crop region {0:?} does not overlap the image")]
    InvalidRegion(CropRegion),

    #[error("Output size must be non-zero, got {width}x{height}")]
    InvalidOutputSize { width: u32, height: u32 },

    #[error("Failed to encode rendered crop: {0}")]
    Encode(#[from] EncodeError),
}

/// Parameters of one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub region: CropRegion,
    pub rotation_degrees: f64,
    pub output_width: u32,
    pub output_height: u32,
}

/// JPEG produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCrop {
    pub width: u32,
    pub height: u32,
    pub jpeg: Vec<u8>,
}

/// Draw the crop into a raster without encoding.
pub fn render_raster(
    source: &DecodedImage,
    request: &RenderRequest,
) -> Result<DecodedImage, RenderError> {
    let (width, height) = (request.output_width, request.output_height);
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidOutputSize { width, height });
    }

    let region = request
        .region
        .clamp_to(source.width, source.height)
        .ok_or(RenderError::InvalidRegion(request.region))?;

    let transform = CanvasTransform::from_degrees(request.rotation_degrees);
    log::debug!(
        "rendering {:?} of {}x{} into {}x{} (rotation {}°)",
        region,
        source.width,
        source.height,
        width,
        height,
        normalize_degrees(request.rotation_degrees)
    );

    Ok(rasterize_crop(source, &region, transform, width, height))
}

/// Decode `source_bytes` and render the requested crop to JPEG.
pub fn render_crop(
    source_bytes: &[u8],
    request: &RenderRequest,
) -> Result<RenderedCrop, RenderError> {
    let source = decode_image(source_bytes)?;
    render_decoded(&source, request)
}

/// Render an already decoded source to JPEG.
pub fn render_decoded(
    source: &DecodedImage,
    request: &RenderRequest,
) -> Result<RenderedCrop, RenderError> {
    let raster = render_raster(source, request)?;
    let jpeg = encode_image(&raster, RENDER_QUALITY)?;

    Ok(RenderedCrop {
        width: raster.width,
        height: raster.height,
        jpeg,
    })
}
