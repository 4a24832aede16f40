//! Output configuration supplied by the form that hosts an upload control.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for an unusable cropper configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Aspect ratio must be a positive number, got {0}")]
    InvalidAspectRatio(f64),

    #[error("Output size must be non-zero, got {width}x{height}")]
    InvalidOutputSize { width: u32, height: u32 },

    #[error("Maximum size must be at least one byte, got {0} MB")]
    InvalidMaxSize(f64),
}

/// Mask shape shown by the interactive preview.
///
/// Presentation only: rendered output is always a full rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropShape {
    #[default]
    Rect,
    Round,
}

/// Output specification for a cropped profile photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropperConfig {
    /// Width ÷ height enforced on the crop region (1 = square).
    pub aspect_ratio: f64,
    /// Rendered width in pixels.
    pub output_width: u32,
    /// Rendered height in pixels.
    pub output_height: u32,
    /// Preview mask shape.
    pub crop_shape: CropShape,
    /// Compressed size budget in megabytes (MiB).
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: f64,
}

impl Default for CropperConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            output_width: 400,
            output_height: 400,
            crop_shape: CropShape::Rect,
            max_size_mb: 1.0,
        }
    }
}

impl CropperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration used by the registration form's round avatar.
    pub fn avatar() -> Self {
        Self {
            crop_shape: CropShape::Round,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return Err(ConfigError::InvalidAspectRatio(self.aspect_ratio));
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(ConfigError::InvalidOutputSize {
                width: self.output_width,
                height: self.output_height,
            });
        }
        // Sub-byte budgets round down to nothing.
        if !self.max_size_mb.is_finite() || self.max_size_mb <= 0.0 || self.max_size_bytes() == 0
        {
            return Err(ConfigError::InvalidMaxSize(self.max_size_mb));
        }
        Ok(())
    }

    /// Largest side the compressed output may have.
    pub fn max_dimension(&self) -> u32 {
        self.output_width.max(self.output_height)
    }

    /// Byte budget for the compressed output.
    pub fn max_size_bytes(&self) -> u64 {
        (self.max_size_mb * 1024.0 * 1024.0).floor() as u64
    }
}
