//! Crop regions in source pixel space.

use serde::{Deserialize, Serialize};

/// Rectangular area of the source image selected for output.
///
/// Coordinates are source pixels (fractional values allowed, as produced by
/// an interactive cropper). Origin is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Region covering a whole image.
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    /// The largest region with the given aspect ratio, centred and divided
    /// by `zoom`. This is the area an interactive cropper shows before the
    /// user pans.
    pub fn centered(image_width: u32, image_height: u32, aspect_ratio: f64, zoom: f64) -> Self {
        let (w, h) = (image_width as f64, image_height as f64);
        let zoom = if zoom.is_finite() { zoom.max(1.0) } else { 1.0 };
        let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            aspect_ratio
        } else {
            1.0
        };

        let (mut crop_w, mut crop_h) = if w / h > aspect {
            (h * aspect, h)
        } else {
            (w, w / aspect)
        };
        crop_w /= zoom;
        crop_h /= zoom;

        Self::new((w - crop_w) / 2.0, (h - crop_h) / 2.0, crop_w, crop_h)
    }

    /// Move the region by a pixel offset, keeping it inside the image.
    pub fn panned(&self, dx: f64, dy: f64, image_width: u32, image_height: u32) -> Self {
        let max_x = (image_width as f64 - self.width).max(0.0);
        let max_y = (image_height as f64 - self.height).max(0.0);
        Self::new(
            (self.x + dx).clamp(0.0, max_x),
            (self.y + dy).clamp(0.0, max_y),
            self.width,
            self.height,
        )
    }

    /// Width ÷ height of the region.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Intersect with the image bounds.
    ///
    /// Returns `None` when nothing of the region lies inside the image or
    /// any coordinate is not finite.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<CropRegion> {
        if ![self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
        {
            return None;
        }

        let left = self.x.max(0.0);
        let top = self.y.max(0.0);
        let right = (self.x + self.width).min(image_width as f64);
        let bottom = (self.y + self.height).min(image_height as f64);

        if right - left <= 0.0 || bottom - top <= 0.0 {
            return None;
        }

        Some(CropRegion::new(left, top, right - left, bottom - top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_region() {
        assert_eq!(CropRegion::full(640, 480), CropRegion::new(0.0, 0.0, 640.0, 480.0));
    }

    #[test]
    fn test_centered_square_on_landscape() {
        let region = CropRegion::centered(600, 400, 1.0, 1.0);
        assert_eq!(region, CropRegion::new(100.0, 0.0, 400.0, 400.0));
    }

    #[test]
    fn test_centered_wide_on_portrait() {
        let region = CropRegion::centered(400, 800, 2.0, 1.0);
        assert_eq!(region, CropRegion::new(0.0, 300.0, 400.0, 200.0));
    }

    #[test]
    fn test_centered_zoom_shrinks_region() {
        let region = CropRegion::centered(400, 400, 1.0, 2.0);
        assert_eq!(region, CropRegion::new(100.0, 100.0, 200.0, 200.0));
    }

    #[test]
    fn test_centered_zoom_below_one_is_ignored() {
        let region = CropRegion::centered(400, 400, 1.0, 0.5);
        assert_eq!(region, CropRegion::full(400, 400));
    }

    #[test]
    fn test_panned_stays_inside() {
        let region = CropRegion::new(100.0, 100.0, 200.0, 200.0);
        let moved = region.panned(500.0, -500.0, 400, 400);
        assert_eq!(moved, CropRegion::new(200.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_clamp_inside_is_unchanged() {
        let region = CropRegion::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(region.clamp_to(100, 100), Some(region));
    }

    #[test]
    fn test_clamp_partially_outside() {
        let region = CropRegion::new(-10.0, 80.0, 50.0, 50.0);
        assert_eq!(
            region.clamp_to(100, 100),
            Some(CropRegion::new(0.0, 80.0, 40.0, 20.0))
        );
    }

    #[test]
    fn test_clamp_fully_outside() {
        let region = CropRegion::new(200.0, 200.0, 50.0, 50.0);
        assert_eq!(region.clamp_to(100, 100), None);
    }

    #[test]
    fn test_clamp_rejects_degenerate() {
        assert_eq!(CropRegion::new(0.0, 0.0, 0.0, 10.0).clamp_to(100, 100), None);
        assert_eq!(
            CropRegion::new(f64::NAN, 0.0, 10.0, 10.0).clamp_to(100, 100),
            None
        );
    }
}
