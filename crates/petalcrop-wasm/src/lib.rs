//! Petalcrop WASM - WebAssembly bindings for Petalcrop
//!
//! This crate exposes the petalcrop-core profile photo pipeline and auth
//! session to the browser UI.
//!
//! # Module Structure
//!
//! - `reader` - Awaitable file reads and data URL encoding
//! - `cropper` - Cropper session for an upload control
//! - `auth` - Cookie-backed auth session and registration form helpers
//! - `types` - WASM-compatible wrapper types for crop results
//! - `logging` - `log` output to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropperSession } from '@petalcrop/wasm';
//!
//! await init();
//!
//! const cropper = new JsCropperSession({ cropShape: 'round' });
//! await cropper.select_file(input.files[0]);
//! const { data_url } = cropper.confirm_crop();
//! ```

use console_error_panic_hook::set_once as set_panic_hook;
use wasm_bindgen::prelude::*;

mod auth;
mod cropper;
mod logging;
mod reader;
mod types;

// Re-export public types
pub use auth::{
    registration_payload, server_error_message, validate_registration, JsAuthSession, JsClock,
};
pub use cropper::JsCropperSession;
pub use logging::set_log_level;
pub use reader::read_file_as_data_url;
pub use types::JsCropOutput;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    set_panic_hook();
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    logging::init_logging(level);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_init_is_repeatable() {
        init();
        init();
        let expected = if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };
        assert_eq!(log::max_level(), expected);
    }
}
