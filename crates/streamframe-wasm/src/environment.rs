//! Browser capability probing

use js_sys::{Array, Reflect};
use std::collections::HashSet;
use streamframe_core::{capability, MediaApi, MediaEnvironment, Platform};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const HLS_MIME: &str = "application/vnd.apple.mpegurl";

/// Snapshot of the current browser's media capabilities
#[derive(Debug, Clone)]
pub struct BrowserEnvironment {
    platform: Platform,
    apis: HashSet<MediaApi>,
}

impl BrowserEnvironment {
    /// Probe the global scope, navigator and a scratch video element
    pub fn detect() -> Self {
        let global = js_sys::global();
        let window = web_sys::window();
        let navigator = window.as_ref().map(|w| w.navigator());

        let user_agent = navigator
            .as_ref()
            .and_then(|n| n.user_agent().ok())
            .unwrap_or_default();

        let probe = Probe {
            promise: has_property(&global, "Promise"),
            typed_arrays: has_property(&global, "Uint8Array"),
            media_source: has_property(&global, "MediaSource") || has_property(&global, "ManagedMediaSource"),
            native_hls: window.as_ref().is_some_and(can_play_native_hls),
            encrypted_media: navigator
                .as_ref()
                .is_some_and(|n| has_property(n, "requestMediaKeySystemAccess")),
        };

        Self {
            platform: Platform::from_user_agent(&user_agent),
            apis: probe.apis(),
        }
    }
}

impl MediaEnvironment for BrowserEnvironment {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn supports(&self, api: MediaApi) -> bool {
        self.apis.contains(&api)
    }
}

/// Raw probe results
#[derive(Debug, Clone, Copy, Default)]
struct Probe {
    promise: bool,
    typed_arrays: bool,
    media_source: bool,
    native_hls: bool,
    encrypted_media: bool,
}

impl Probe {
    fn apis(&self) -> HashSet<MediaApi> {
        [
            (self.promise, MediaApi::Promises),
            (self.typed_arrays, MediaApi::TypedArrays),
            (self.media_source, MediaApi::MediaSource),
            (self.native_hls, MediaApi::NativeHls),
            (self.encrypted_media, MediaApi::EncryptedMedia),
        ]
        .into_iter()
        .filter_map(|(present, api)| present.then_some(api))
        .collect()
    }
}

fn has_property(target: &JsValue, name: &str) -> bool {
    Reflect::has(target, &JsValue::from_str(name)).unwrap_or(false)
}

fn can_play_native_hls(window: &web_sys::Window) -> bool {
    window
        .document()
        .and_then(|d| d.create_element("video").ok())
        .and_then(|e| e.dyn_into::<web_sys::HtmlMediaElement>().ok())
        .is_some_and(|video| !video.can_play_type(HLS_MIME).is_empty())
}

/// Check the browser before constructing a player
#[wasm_bindgen]
pub fn is_environment_supported() -> bool {
    let env = BrowserEnvironment::detect();
    let supported = capability::check_support(&env);
    if !supported {
        web_sys::console::error_1(&"[Streamframe WASM] Browser not supported".into());
    }
    supported
}

/// Names of the missing media APIs
#[wasm_bindgen]
pub fn missing_apis() -> Array {
    capability::missing_apis(&BrowserEnvironment::detect())
        .into_iter()
        .map(|api| JsValue::from_str(&api.to_string()))
        .collect()
}

/// Platform family for a user agent ("apple-webkit" or "other")
#[wasm_bindgen]
pub fn detect_platform(user_agent: &str) -> String {
    Platform::from_user_agent(user_agent).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_apis() {
        let probe = Probe {
            promise: true,
            typed_arrays: true,
            media_source: false,
            native_hls: true,
            encrypted_media: true,
        };

        let env = BrowserEnvironment {
            platform: Platform::AppleWebKit,
            apis: probe.apis(),
        };
        assert!(capability::check_support(&env));
        assert!(!env.supports(MediaApi::MediaSource));

        let env = BrowserEnvironment {
            platform: Platform::Other,
            apis: Probe::default().apis(),
        };
        assert_eq!(capability::missing_apis(&env).len(), 4);
    }

    #[test]
    fn test_detect_platform() {
        let safari = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 \
                      (KHTML, like Gecko) Version/17.0 Safari/605.1.15";
        assert_eq!(detect_platform(safari), "apple-webkit");
        assert_eq!(detect_platform("Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/120.0"), "other");
    }
}
