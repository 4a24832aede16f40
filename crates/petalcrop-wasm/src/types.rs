//! WASM-compatible wrapper types for crop results.

use petalcrop_core::compress::CompressedFile;
use petalcrop_core::session::CropOutput;
use petalcrop_core::CropperError;
use wasm_bindgen::prelude::*;

/// A finished crop for JavaScript.
///
/// `data_url` is what the form previews and submits as `user_image`;
/// `bytes` is the compressed file for hosts that upload it as a blob.
#[wasm_bindgen]
pub struct JsCropOutput {
    data_url: String,
    bytes: Vec<u8>,
    mime_type: String,
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl JsCropOutput {
    #[wasm_bindgen(getter)]
    pub fn data_url(&self) -> String {
        self.data_url.clone()
    }

    /// Compressed file bytes as a `Uint8Array` (copied out of WASM memory).
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.mime_type.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }
}

impl JsCropOutput {
    pub(crate) fn from_parts(data_url: &str, file: &CompressedFile) -> Self {
        Self {
            data_url: data_url.to_string(),
            bytes: file.bytes.clone(),
            mime_type: file.mime_type.clone(),
            width: file.width,
            height: file.height,
        }
    }
}

impl From<CropOutput> for JsCropOutput {
    fn from(output: CropOutput) -> Self {
        Self {
            data_url: output.data_url,
            bytes: output.file.bytes,
            mime_type: output.file.mime_type,
            width: output.file.width,
            height: output.file.height,
        }
    }
}

/// Convert a pipeline error into the message the upload control shows.
pub(crate) fn to_js_error(err: &CropperError) -> JsValue {
    JsValue::from_str(&err.user_message())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> CropOutput {
        CropOutput {
            data_url: "data:image/jpeg;base64,AAEC".to_string(),
            file: CompressedFile {
                bytes: vec![0, 1, 2],
                mime_type: "image/jpeg".to_string(),
                width: 400,
                height: 400,
            },
        }
    }

    #[test]
    fn test_from_crop_output() {
        let js = JsCropOutput::from(output());
        assert_eq!(js.data_url(), "data:image/jpeg;base64,AAEC");
        assert_eq!(js.bytes(), vec![0, 1, 2]);
        assert_eq!(js.mime_type(), "image/jpeg");
        assert_eq!((js.width(), js.height()), (400, 400));
        assert_eq!(js.byte_length(), 3);
    }

    #[test]
    fn test_from_parts_matches_conversion() {
        let out = output();
        let js = JsCropOutput::from_parts(&out.data_url, &out.file);
        assert_eq!(js.data_url(), out.data_url);
        assert_eq!(js.bytes(), out.file.bytes);
    }
}
