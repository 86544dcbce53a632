//! FairPlay license filters for the JS engine's networking layer
//!
//! Requests and responses are the engine's own objects (`body`/`headers`
//! and `data`); they are mutated in place.

use crate::to_js_error;
use js_sys::{ArrayBuffer, Object, Reflect, Uint8Array};
use streamframe_core::{Error, FairPlayLicenseFilter, LicenseRequest, LicenseResponse, NetworkFilter, RequestType};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// SPC/CKC adapter registered as request and response filter
#[wasm_bindgen]
#[derive(Default)]
pub struct StreamframeFairPlayFilter {
    inner: FairPlayLicenseFilter,
    exchanges: u32,
}

#[wasm_bindgen]
impl StreamframeFairPlayFilter {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite a LICENSE request body to `spc=<base64>`
    #[wasm_bindgen]
    pub fn filter_request(&mut self, request_type: u32, request: &JsValue) -> Result<(), JsValue> {
        let request_type = RequestType::from_code(request_type);
        if !request_type.is_license() {
            return Ok(());
        }

        let mut license = LicenseRequest::new(request_type, read_bytes(request, "body")?);
        self.inner.filter_request(&mut license).map_err(to_js_error)?;

        Reflect::set(request, &"body".into(), &Uint8Array::from(&license.body[..]))?;

        let headers = match Reflect::get(request, &"headers".into())? {
            h if h.is_object() => h,
            _ => {
                let h: JsValue = Object::new().into();
                Reflect::set(request, &"headers".into(), &h)?;
                h
            }
        };
        for (name, value) in &license.headers {
            Reflect::set(&headers, &name.as_str().into(), &value.as_str().into())?;
        }

        self.exchanges += 1;
        Ok(())
    }

    /// Unwrap and decode a LICENSE response into the raw CKC
    #[wasm_bindgen]
    pub fn filter_response(&self, request_type: u32, response: &JsValue) -> Result<(), JsValue> {
        let request_type = RequestType::from_code(request_type);
        if !request_type.is_license() {
            return Ok(());
        }

        let mut license = LicenseResponse::new(request_type, read_bytes(response, "data")?);
        self.inner.filter_response(&mut license).map_err(to_js_error)?;

        Reflect::set(response, &"data".into(), &Uint8Array::from(&license.data[..]))?;
        Ok(())
    }

    /// Number of license requests rewritten so far
    #[wasm_bindgen(getter)]
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }
}

/// Copy a `BufferSource` property (`ArrayBuffer` or any view over one)
///
/// Only the bytes the view covers are copied. A missing payload is an error.
fn read_bytes(target: &JsValue, key: &str) -> Result<Vec<u8>, JsValue> {
    let value = Reflect::get(target, &key.into())?;
    if value.is_undefined() || value.is_null() {
        return Err(to_js_error(Error::license(format!("license {key} is missing"))));
    }

    if let Some(buffer) = value.dyn_ref::<ArrayBuffer>() {
        return Ok(Uint8Array::new(buffer).to_vec());
    }

    if ArrayBuffer::is_view(&value) {
        let buffer = Reflect::get(&value, &"buffer".into())?;
        let offset = byte_property(&value, "byteOffset")?;
        let length = byte_property(&value, "byteLength")?;
        return Ok(Uint8Array::new_with_byte_offset_and_length(&buffer, offset, length).to_vec());
    }

    Err(to_js_error(Error::license(format!(
        "license {key} is not an ArrayBuffer or ArrayBufferView"
    ))))
}

fn byte_property(view: &JsValue, key: &str) -> Result<u32, JsValue> {
    Reflect::get(view, &key.into())?
        .as_f64()
        .map(|n| n as u32)
        .ok_or_else(|| to_js_error(Error::license(format!("buffer view has no numeric {key}"))))
}
