//! DRM configuration for the JS engine

use crate::environment::BrowserEnvironment;
use crate::to_js_error;
use js_sys::{Reflect, Uint8Array};
use serde::Serialize;
use streamframe_core::{DrmProfile, DrmResolver, DrmSettings, MediaEnvironment, Platform};
use wasm_bindgen::prelude::*;

/// Engine configuration for the detected platform
///
/// `settings` takes the camelCase `DrmSettings` JSON shape; `undefined` uses
/// the defaults.
#[wasm_bindgen]
pub fn resolve_drm_config(key_id: &str, certificate: Option<Uint8Array>, settings: JsValue) -> Result<JsValue, JsValue> {
    let platform = BrowserEnvironment::detect().platform();
    resolve(platform, key_id, certificate, settings)
}

/// Engine configuration for an explicit platform ("apple-webkit" or "other")
#[wasm_bindgen]
pub fn resolve_drm_config_for(
    platform: &str,
    key_id: &str,
    certificate: Option<Uint8Array>,
    settings: JsValue,
) -> Result<JsValue, JsValue> {
    let platform: Platform = platform.parse().map_err(to_js_error)?;
    resolve(platform, key_id, certificate, settings)
}

fn resolve(
    platform: Platform,
    key_id: &str,
    certificate: Option<Uint8Array>,
    settings: JsValue,
) -> Result<JsValue, JsValue> {
    let mut settings: DrmSettings = if settings.is_undefined() || settings.is_null() {
        DrmSettings::default()
    } else {
        serde_wasm_bindgen::from_value(settings)?
    };

    if let Some(cert) = certificate {
        settings = settings.with_certificate(cert.to_vec());
    }

    settings.validate().map_err(to_js_error)?;
    let profile = DrmResolver::new(settings).resolve(platform, key_id).map_err(to_js_error)?;

    let config = profile
        .to_engine_config()
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())?;
    attach_certificate(&config, &profile)?;

    Ok(config)
}

/// Replace the byte-array certificate with a `Uint8Array`
fn attach_certificate(config: &JsValue, profile: &DrmProfile) -> Result<(), JsValue> {
    let Some(cert) = profile.server_certificate() else {
        return Ok(());
    };

    let drm = Reflect::get(config, &"drm".into())?;
    let advanced = Reflect::get(&drm, &"advanced".into())?;
    let system = Reflect::get(&advanced, &profile.key_system().into())?;
    Reflect::set(&system, &"serverCertificate".into(), &Uint8Array::from(&cert[..]))?;

    Ok(())
}
