//! Image decoding for the profile photo pipeline.
//!
//! This module provides functionality for:
//! - Decoding user-selected JPEG and PNG files
//! - Applying EXIF orientation the way a browser image element does
//! - Resizing decoded images to fit a bounding edge
//!
//! # Architecture
//!
//! Decoding is the first step of both the crop renderer and the compressor.
//! All operations are synchronous and single-threaded; the WASM host runs
//! them inside a Web Worker so the UI thread stays responsive.
//!
//! # Examples
//!
//! ```ignore
//! use petalcrop_core::decode::decode_image;
//!
//! let bytes = std::fs::read("portrait.png").unwrap();
//! let image = decode_image(&bytes).unwrap();
//! println!("Decoded {}x{} image", image.width, image.height);
//! ```

mod load;
mod resize;
mod types;

pub use load::{decode_image, exif_orientation};
pub use resize::{resize, resize_to_fit};
pub use types::{DecodeError, DecodedImage};
