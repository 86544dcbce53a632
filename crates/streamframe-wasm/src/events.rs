//! Event helpers for JS hosts

use js_sys::Array;
use streamframe_core::{event_names, DistinctUntilChanged};
use wasm_bindgen::prelude::*;

/// Event names to listen for: `extra` first, then the defaults
#[wasm_bindgen]
pub fn default_event_names(extra: JsValue) -> Result<Array, JsValue> {
    let extra: Vec<String> = if extra.is_undefined() || extra.is_null() {
        Vec::new()
    } else {
        serde_wasm_bindgen::from_value(extra)?
    };

    Ok(event_names(&extra).into_iter().map(JsValue::from).collect())
}

/// Drops an event identical to the one admitted just before it
///
/// Identity is JS strict equality, so the same native event object
/// delivered twice is suppressed while a new event of the same type is not.
#[wasm_bindgen]
#[derive(Default)]
pub struct StreamframeEventDeduplicator {
    last: DistinctUntilChanged<JsValue>,
    dropped: u32,
}

#[wasm_bindgen]
impl StreamframeEventDeduplicator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `event` should be forwarded
    #[wasm_bindgen]
    pub fn admit(&mut self, event: JsValue) -> bool {
        let admitted = self.last.admit(&event);
        if !admitted {
            self.dropped += 1;
        }
        admitted
    }

    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.last.reset();
    }

    /// Events suppressed so far
    #[wasm_bindgen(getter)]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}
