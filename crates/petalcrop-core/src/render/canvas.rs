//! Software rasterisation of a rotated, scaled crop.
//!
//! Reproduces what a 2D canvas does for
//!
//! ```text
//! translate(W/2, H/2); rotate(θ); translate(-W/2, -H/2);
//! drawImage(src, rx, ry, rw, rh, 0, 0, W, H);
//! ```
//!
//! using inverse mapping: for every output pixel centre `p`, the drawn
//! position is `q = c + R(-θ)(p - c)`. If `q` falls inside `[0,W)×[0,H)`
//! the source is sampled at `region.origin + q * region.size / (W, H)`,
//! otherwise the pixel stays black. Canvas y points down, so a positive
//! angle turns the picture clockwise on screen.

use super::CropRegion;
use crate::decode::DecodedImage;

const ANGLE_EPSILON: f64 = 1e-9;

/// Rotation about the centre of the output buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    sin: f64,
    cos: f64,
}

impl CanvasTransform {
    /// Build the transform for a rotation in degrees.
    ///
    /// Angles are taken modulo a full turn, so 360° is exactly the identity.
    /// Quarter turns use exact sine/cosine values so they map pixel centres
    /// onto pixel centres.
    pub fn from_degrees(degrees: f64) -> Self {
        let degrees = normalize_degrees(degrees);

        let (sin, cos) = if degrees < ANGLE_EPSILON {
            (0.0, 1.0)
        } else if (degrees - 90.0).abs() < ANGLE_EPSILON {
            (1.0, 0.0)
        } else if (degrees - 180.0).abs() < ANGLE_EPSILON {
            (0.0, -1.0)
        } else if (degrees - 270.0).abs() < ANGLE_EPSILON {
            (-1.0, 0.0)
        } else {
            degrees.to_radians().sin_cos()
        };

        Self { sin, cos }
    }

    pub fn identity() -> Self {
        Self { sin: 0.0, cos: 1.0 }
    }

    pub fn is_identity(&self) -> bool {
        self.sin == 0.0 && self.cos == 1.0
    }

    /// Map an output position back to the drawn (pre-rotation) position.
    #[inline]
    fn inverse(&self, px: f64, py: f64, cx: f64, cy: f64) -> (f64, f64) {
        let dx = px - cx;
        let dy = py - cy;
        (
            cx + self.cos * dx + self.sin * dy,
            cy - self.sin * dx + self.cos * dy,
        )
    }
}

/// Normalise an angle into `[0, 360)`, folding values within epsilon of a
/// full turn back to zero. Non-finite angles become zero.
pub fn normalize_degrees(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let d = degrees.rem_euclid(360.0);
    if 360.0 - d < ANGLE_EPSILON {
        0.0
    } else {
        d
    }
}

/// Draw `region` of `source` into a new `out_width × out_height` buffer.
///
/// `region` must already be clamped to the source bounds and the output
/// size must be non-zero; the caller validates both.
pub fn rasterize_crop(
    source: &DecodedImage,
    region: &CropRegion,
    transform: CanvasTransform,
    out_width: u32,
    out_height: u32,
) -> DecodedImage {
    let mut output = DecodedImage::blank(out_width, out_height);

    let (w, h) = (out_width as f64, out_height as f64);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let scale_x = region.width / w;
    let scale_y = region.height / h;

    for oy in 0..out_height {
        for ox in 0..out_width {
            let (qx, qy) = transform.inverse(ox as f64 + 0.5, oy as f64 + 0.5, cx, cy);
            if qx < 0.0 || qx >= w || qy < 0.0 || qy >= h {
                continue;
            }

            // Continuous source coordinate, shifted to pixel-index space
            let sx = region.x + qx * scale_x - 0.5;
            let sy = region.y + qy * scale_y - 0.5;
            let pixel = sample_bilinear(source, region, sx, sy);

            let idx = ((oy as usize) * (out_width as usize) + ox as usize) * 3;
            output.pixels[idx..idx + 3].copy_from_slice(&pixel);
        }
    }

    output
}

#[inline]
fn get_pixel_f64(image: &DecodedImage, px: usize, py: usize) -> [f64; 3] {
    let idx = (py * image.width as usize + px) * 3;
    [
        image.pixels[idx] as f64,
        image.pixels[idx + 1] as f64,
        image.pixels[idx + 2] as f64,
    ]
}

/// Bilinear sample clamped to the pixels covered by `region`, so edges of
/// the crop never bleed in neighbouring content.
fn sample_bilinear(image: &DecodedImage, region: &CropRegion, x: f64, y: f64) -> [u8; 3] {
    let min_x = region.x.floor().max(0.0);
    let min_y = region.y.floor().max(0.0);
    let max_x = ((region.x + region.width).ceil() - 1.0).min(image.width as f64 - 1.0);
    let max_y = ((region.y + region.height).ceil() - 1.0).min(image.height as f64 - 1.0);

    let x = x.clamp(min_x, max_x.max(min_x));
    let y = y.clamp(min_y, max_y.max(min_y));

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(max_x.max(min_x) as usize);
    let y1 = (y0 + 1).min(max_y.max(min_y) as usize);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = get_pixel_f64(image, x0, y0);
    let p10 = get_pixel_f64(image, x1, y0);
    let p01 = get_pixel_f64(image, x0, y1);
    let p11 = get_pixel_f64(image, x1, y1);

    let mut result = [0u8; 3];
    for i in 0..3 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        result[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    result
}
