//! JPEG encoding for rendered and compressed crops.
//!
//! Both the crop renderer (quality 95, mirroring `canvas.toBlob(.., 0.95)`)
//! and the compressor's quality search encode through here.

mod jpeg;

pub use jpeg::{encode_image, EncodeError, JPEG_MIME};
