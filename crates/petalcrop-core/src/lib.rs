//! Petalcrop Core - profile photo pipeline
//!
//! This crate provides the client-side pieces of the registration flow:
//! file validation, data-URL encoding, crop rendering with rotation,
//! size-budgeted compression, the cropper session state machine, and the
//! auth session store.

pub mod auth;
pub mod compress;
pub mod config;
pub mod dataurl;
pub mod decode;
pub mod encode;
pub mod error;
pub mod form;
pub mod render;
pub mod session;
pub mod validate;

#[cfg(test)]
mod test_helpers;

pub use auth::{AuthSession, Clock, Expiry, ExpiryPolicy, MemorySessionStore, Role, SessionStore};
pub use compress::{compress_image, CompressedFile, CompressionOptions};
pub use config::{CropShape, CropperConfig};
pub use dataurl::{decode_data_url, encode_data_url, DataUrl, ReadError};
pub use error::CropperError;
pub use form::{AuthResponse, LoginRequest, RegistrationForm, RegistrationPayload};
pub use render::{render_crop, CropRegion, RenderRequest, RenderedCrop};
pub use session::{
    transition, CropAdjustment, CropJob, CropOutput, CropperSession, CropperSessionState,
    SessionEvent, SessionSnapshot, SourceImage,
};
pub use validate::{validate_file, FileHandle, ValidationError};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_image, png_bytes};

    #[test]
    fn test_registration_flow_with_avatar() {
        let mut cropper = CropperSession::new(CropperConfig::avatar()).unwrap();
        let bytes = png_bytes(&gradient_image(640, 480));
        let file = FileHandle::new("bouquet.png", "image/png", bytes.len() as u64);

        cropper.select_file(&file, bytes).unwrap();
        let output = cropper.confirm_crop().unwrap();
        assert_eq!((output.file.width, output.file.height), (400, 400));
        assert!(output.file.size() <= CropperConfig::avatar().max_size_bytes());

        let form = RegistrationForm {
            full_name: "Hana".into(),
            contact_number: "0771234567".into(),
            email_address: "hana@example.com".into(),
            password: "ikebana".into(),
            confirm_password: "ikebana".into(),
        };
        form.validate().unwrap();
        let payload = form.into_payload(cropper.cropped_image().map(str::to_string));

        let avatar = decode_data_url(payload.user_image.as_deref().unwrap()).unwrap();
        assert_eq!(avatar.mime_type, "image/jpeg");
        assert_eq!(avatar.bytes, output.file.bytes);
    }
}
