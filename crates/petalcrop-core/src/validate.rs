//! File picker validation.
//!
//! Runs before any bytes are read: only the declared MIME type and the byte
//! size reported by the picker are inspected. A rejected file never touches
//! cropper session state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// MIME types accepted for profile photos.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Largest original file accepted, in bytes (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Errors reported for a rejected file selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// MIME type is not JPEG or PNG.
    #[error("Only PNG, JPG and JPEG file types are allowed")]
    UnsupportedType(String),

    /// File exceeds `MAX_FILE_SIZE`.
    #[error("Image size must be less than 10MB")]
    TooLarge { size: u64, limit: u64 },

    /// Picker reported no file.
    #[error("No file selected")]
    NoFile,
}

/// A user-selected file as reported by the upload control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    /// File name as shown by the picker.
    pub name: String,
    /// Declared MIME type (`File.type`).
    pub mime_type: String,
    /// Declared size in bytes (`File.size`).
    pub size: u64,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size,
        }
    }
}

/// Check whether a MIME type is one of the accepted image types.
pub fn is_accepted_mime(mime_type: &str) -> bool {
    let mime = mime_type.trim();
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(mime))
}

/// Validate a selected file's type and size.
///
/// The type check runs first, so an oversized GIF reports the type error.
/// Either way the file is rejected.
pub fn validate_file(file: &FileHandle) -> Result<(), ValidationError> {
    if !is_accepted_mime(&file.mime_type) {
        log::warn!(
            "rejected file {:?}: unsupported type {:?}",
            file.name,
            file.mime_type
        );
        return Err(ValidationError::UnsupportedType(file.mime_type.clone()));
    }

    if file.size > MAX_FILE_SIZE {
        log::warn!(
            "rejected file {:?}: {} bytes exceeds {}",
            file.name,
            file.size,
            MAX_FILE_SIZE
        );
        return Err(ValidationError::TooLarge {
            size: file.size,
            limit: MAX_FILE_SIZE,
        });
    }

    Ok(())
}
