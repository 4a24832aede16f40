//! Error taxonomy surfaced to the upload control.
//!
//! Every pipeline stage has its own error enum; `CropperError` gathers them
//! so the session and the bindings deal with a single type. None of these
//! are fatal: each leaves the session in a state the user can retry from.

use thiserror::Error;

use crate::compress::CompressionError;
use crate::config::ConfigError;
use crate::dataurl::ReadError;
use crate::decode::DecodeError;
use crate::render::RenderError;
use crate::session::SessionError;
use crate::validate::ValidationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropperError {
    /// Bad file type or size; the user picks another file.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// File or blob read failed.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// Source image could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Crop could not be drawn (bad region or output size).
    #[error(transparent)]
    Render(RenderError),

    /// Rendered crop could not be compressed.
    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<RenderError> for CropperError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Decode(e) => CropperError::Decode(e),
            other => CropperError::Render(other),
        }
    }
}

impl CropperError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            CropperError::Validation(e) => e.to_string(),
            CropperError::Read(e) => format!("Failed to process image: {}", e),
            CropperError::Session(SessionError::Busy) => {
                "Please wait until the current image has been processed.".to_string()
            }
            _ => "Failed to crop image. Please try again.".to_string(),
        }
    }

    /// Whether the error came from rejecting a file before reading it.
    pub fn is_validation(&self) -> bool {
        matches!(self, CropperError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CropRegion;

    #[test]
    fn test_render_decode_error_maps_to_decode() {
        let err: CropperError = RenderError::Decode(DecodeError::InvalidFormat).into();
        assert_eq!(err, CropperError::Decode(DecodeError::InvalidFormat));
    }

    #[test]
    fn test_render_region_error_stays_render() {
        let region = CropRegion::new(0.0, 0.0, 0.0, 0.0);
        let err: CropperError = RenderError::InvalidRegion(region).into();
        assert!(matches!(err, CropperError::Render(_)));
    }

    #[test]
    fn test_user_messages() {
        let err = CropperError::from(ValidationError::UnsupportedType("image/gif".into()));
        assert_eq!(
            err.user_message(),
            "Only PNG, JPG and JPEG file types are allowed"
        );
        assert!(err.is_validation());

        let err = CropperError::from(ReadError::Io("aborted".into()));
        assert_eq!(
            err.user_message(),
            "Failed to process image: Failed to read file: aborted"
        );

        let err = CropperError::from(DecodeError::InvalidFormat);
        assert_eq!(err.user_message(), "Failed to crop image. Please try again.");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_display_is_transparent() {
        let err = CropperError::from(DecodeError::InvalidFormat);
        assert_eq!(err.to_string(), "Invalid or unsupported image format");
    }
}
