//! Cropper session bindings.
//!
//! One `JsCropperSession` backs one upload control. The file read is the
//! only asynchronous step exposed to JavaScript; cropping runs synchronously
//! so hosts that care about UI latency call it from a Web Worker.
//!
//! ```typescript
//! import { JsCropperSession } from '@petalcrop/wasm';
//!
//! const cropper = new JsCropperSession({ outputWidth: 400, outputHeight: 400, cropShape: 'round' });
//! await cropper.select_file(input.files[0]);
//! cropper.adjust_crop({ region: { x, y, width, height }, zoom, rotationDegrees });
//! const result = cropper.confirm_crop();
//! form.user_image = result.data_url;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use petalcrop_core::config::CropperConfig;
use petalcrop_core::session::{CropAdjustment, CropperSession, SessionError};
use petalcrop_core::validate::FileHandle;
use petalcrop_core::CropperError;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::File;

use crate::reader::{file_handle, read_file_bytes};
use crate::types::{to_js_error, JsCropOutput};

/// State of an upload control's cropper.
#[wasm_bindgen]
pub struct JsCropperSession {
    inner: Rc<RefCell<CropperSession>>,
}

impl JsCropperSession {
    pub(crate) fn with_config(config: CropperConfig) -> Result<Self, CropperError> {
        let session = CropperSession::new(config)?;
        Ok(Self {
            inner: Rc::new(RefCell::new(session)),
        })
    }
}

#[wasm_bindgen]
impl JsCropperSession {
    /// Create a session. `config` may be omitted for the defaults
    /// (square, 400x400, 1 MB).
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsCropperSession, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            CropperConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid cropper config: {}", e)))?
        };
        Self::with_config(config).map_err(|e| to_js_error(&e))
    }

    /// Validate, read and preview a picked file.
    ///
    /// Rejects with the validation message (the control should clear its
    /// value) or the read error. Invalid files leave the session untouched,
    /// as does a read overtaken by `reset`, `cancel` or a newer pick.
    pub fn select_file(&self, file: File) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let handle = file_handle(&file);
            let read_id = inner
                .borrow_mut()
                .begin_read(&handle)
                .map_err(|e| to_js_error(&e))?;

            let contents = read_file_bytes(&file).await;
            let loaded = inner.borrow_mut().load_file(read_id, &handle, contents);
            match loaded {
                // The user moved on; nothing to report.
                Ok(()) | Err(CropperError::Session(SessionError::StaleRead(_))) => {
                    Ok(JsValue::UNDEFINED)
                }
                Err(e) => Err(to_js_error(&e)),
            }
        })
    }

    /// Load a file whose bytes the host already has (drag and drop, paste).
    pub fn select_bytes(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<(), JsValue> {
        let handle = FileHandle::new(name, mime_type, bytes.len() as u64);
        self.inner
            .borrow_mut()
            .select_file(&handle, bytes)
            .map_err(|e| to_js_error(&e))
    }

    /// Record pan/zoom/rotate from the crop modal:
    /// `{ region: {x, y, width, height}, zoom, rotationDegrees }`.
    pub fn adjust_crop(&self, adjustment: JsValue) -> Result<(), JsValue> {
        let adjustment: CropAdjustment = serde_wasm_bindgen::from_value(adjustment)
            .map_err(|e| JsValue::from_str(&format!("Invalid crop adjustment: {}", e)))?;
        self.inner
            .borrow_mut()
            .adjust_crop(adjustment)
            .map_err(|e| to_js_error(&e))
    }

    /// Render and compress the current crop.
    pub fn confirm_crop(&self) -> Result<JsCropOutput, JsValue> {
        self.inner
            .borrow_mut()
            .confirm_crop()
            .map(JsCropOutput::from)
            .map_err(|e| to_js_error(&e))
    }

    /// Close the modal without cropping. A previous crop is kept.
    pub fn cancel(&self) -> Result<(), JsValue> {
        self.inner.borrow_mut().cancel().map_err(|e| to_js_error(&e))
    }

    pub fn reset(&self) {
        self.inner.borrow_mut().reset();
    }

    pub fn clear_cropped_image(&self) {
        self.inner.borrow_mut().clear_cropped_image();
    }

    /// "idle", "previewing", "cropping", "processing" or "error".
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.inner.borrow().state().as_str().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn show_cropper(&self) -> bool {
        self.inner.borrow().show_cropper()
    }

    #[wasm_bindgen(getter)]
    pub fn is_processing(&self) -> bool {
        self.inner.borrow().is_processing()
    }

    /// Data URL of the picked file while the modal is open.
    #[wasm_bindgen(getter)]
    pub fn original_image(&self) -> Option<String> {
        self.inner
            .borrow()
            .original_image()
            .map(|source| source.data_url().to_string())
    }

    /// Data URL of the last successful crop.
    #[wasm_bindgen(getter)]
    pub fn cropped_image(&self) -> Option<String> {
        self.inner.borrow().cropped_image().map(str::to_string)
    }

    /// The last successful crop with its compressed file.
    #[wasm_bindgen(getter)]
    pub fn image_file(&self) -> Option<JsCropOutput> {
        let session = self.inner.borrow();
        match (session.cropped_image(), session.image_file()) {
            (Some(data_url), Some(file)) => Some(JsCropOutput::from_parts(data_url, file)),
            _ => None,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.inner.borrow().error().map(str::to_string)
    }

    /// Active configuration as a plain object.
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.borrow().config())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
