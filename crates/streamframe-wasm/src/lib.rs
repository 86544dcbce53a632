//! Streamframe WASM - browser bindings for the embedded player
//!
//! Runs next to a JS adaptive-streaming engine (e.g. shaka-player):
//! - Capability check against the real browser globals
//! - DRM engine configuration for the detected platform
//! - FairPlay SPC/CKC request and response filters
//! - Media event de-duplication
//!
//! ## Integration with shaka-player
//!
//! ```javascript
//! import init, { is_environment_supported, resolve_drm_config, StreamframeFairPlayFilter } from '@streamframe/wasm';
//!
//! await init();
//! if (!is_environment_supported()) throw new Error('unsupported browser');
//!
//! const player = new shaka.Player(video);
//! player.configure(resolve_drm_config(keyId, certificate));
//!
//! const filter = new StreamframeFairPlayFilter();
//! const net = player.getNetworkingEngine();
//! net.registerRequestFilter((type, request) => filter.filter_request(type, request));
//! net.registerResponseFilter((type, response) => filter.filter_response(type, response));
//! ```

use wasm_bindgen::prelude::*;

mod drm;
mod environment;
mod events;
mod license_filter;

pub use drm::{resolve_drm_config, resolve_drm_config_for};
pub use environment::{detect_platform, is_environment_supported, missing_apis, BrowserEnvironment};
pub use events::{default_event_names, StreamframeEventDeduplicator};
pub use license_filter::StreamframeFairPlayFilter;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    web_sys::console::log_1(&"[Streamframe WASM] Initialized".into());
}

/// Library version
#[wasm_bindgen]
pub fn version() -> String {
    streamframe_core::VERSION.to_string()
}

/// Convert a core error into a JS `Error` named after its error code
pub(crate) fn to_js_error(err: streamframe_core::Error) -> JsValue {
    let js = js_sys::Error::new(&err.to_string());
    js.set_name(err.error_code());
    js.into()
}
