//! Awaitable file reads.
//!
//! A `File` is read through `Blob.arrayBuffer()`, so one `await` yields
//! either the bytes or a `ReadError`.
//!
//! ```typescript
//! import { read_file_as_data_url } from '@petalcrop/wasm';
//!
//! const dataUrl = await read_file_as_data_url(input.files[0]);
//! ```

use js_sys::Uint8Array;
use petalcrop_core::dataurl::{encode_data_url, ReadError};
use petalcrop_core::validate::FileHandle;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::File;

/// Name, declared type and size of a picked file.
pub(crate) fn file_handle(file: &File) -> FileHandle {
    FileHandle::new(file.name(), file.type_(), file.size() as u64)
}

pub(crate) fn describe_js_error(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// Read the whole file into memory.
pub(crate) async fn read_file_bytes(file: &File) -> Result<Vec<u8>, ReadError> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| ReadError::Io(describe_js_error(&e)))?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    log::debug!("read {} bytes from {:?}", bytes.len(), file.name());
    Ok(bytes)
}

/// Read a file and encode it as a base64 data URL.
///
/// Resolves with the data URL or rejects with the read error message.
#[wasm_bindgen]
pub async fn read_file_as_data_url(file: File) -> Result<String, JsValue> {
    let bytes = read_file_bytes(&file)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(encode_data_url(&file.type_(), &bytes))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use js_sys::Array;
    use petalcrop_core::dataurl::decode_data_url;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn make_file(bytes: &[u8], name: &str, mime: &str) -> File {
        let parts = Array::new();
        parts.push(&Uint8Array::from(bytes));
        let options = web_sys::FilePropertyBag::new();
        options.set_type(mime);
        File::new_with_u8_array_sequence_and_options(&parts, name, &options).unwrap()
    }

    #[wasm_bindgen_test]
    async fn test_read_file_as_data_url() {
        let file = make_file(b"hello", "greeting.png", "image/png");
        let url = read_file_as_data_url(file).await.unwrap();
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");
        assert_eq!(decode_data_url(&url).unwrap().bytes, b"hello");
    }

    #[wasm_bindgen_test]
    fn test_file_handle() {
        let file = make_file(&[1, 2, 3], "rose.jpg", "image/jpeg");
        let handle = file_handle(&file);
        assert_eq!(handle, FileHandle::new("rose.jpg", "image/jpeg", 3));
    }
}
