//! Capability check
//!
//! Gates player construction on the media APIs the engine relies on.

use crate::error::{Error, Result};
use crate::platform::Platform;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Media-related runtime APIs the engine depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaApi {
    /// Promise-based async primitives
    Promises,
    /// Typed byte arrays
    TypedArrays,
    /// Media Source Extensions
    MediaSource,
    /// Native HLS playback on the media element
    NativeHls,
    /// Encrypted Media Extensions
    EncryptedMedia,
}

impl std::fmt::Display for MediaApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaApi::Promises => write!(f, "Promise"),
            MediaApi::TypedArrays => write!(f, "TypedArrays"),
            MediaApi::MediaSource => write!(f, "MediaSourceExtensions"),
            MediaApi::NativeHls => write!(f, "NativeHls"),
            MediaApi::EncryptedMedia => write!(f, "EncryptedMediaExtensions"),
        }
    }
}

/// APIs that must all be present
const REQUIRED: &[MediaApi] = &[MediaApi::Promises, MediaApi::TypedArrays, MediaApi::EncryptedMedia];

/// The runtime hosting the player
pub trait MediaEnvironment {
    /// Platform family used for DRM selection
    fn platform(&self) -> Platform;

    /// Whether the given API is available
    fn supports(&self, api: MediaApi) -> bool;
}

/// Returns the APIs the environment is missing, empty when supported
pub fn missing_apis(env: &dyn MediaEnvironment) -> Vec<MediaApi> {
    let mut missing: Vec<MediaApi> = REQUIRED
        .iter()
        .copied()
        .filter(|api| !env.supports(*api))
        .collect();

    // Either streaming path is enough
    if !env.supports(MediaApi::MediaSource) && !env.supports(MediaApi::NativeHls) {
        missing.push(MediaApi::MediaSource);
    }

    missing
}

/// Check whether the environment can host the player
pub fn check_support(env: &dyn MediaEnvironment) -> bool {
    let supported = missing_apis(env).is_empty();
    debug!(platform = %env.platform(), supported, "Capability check");
    supported
}

/// Like [`check_support`], but reports what is missing
pub fn ensure_supported(env: &dyn MediaEnvironment) -> Result<()> {
    let missing = missing_apis(env);
    if missing.is_empty() {
        return Ok(());
    }

    warn!(platform = %env.platform(), ?missing, "Environment unsupported");
    Err(Error::EnvironmentUnsupported { missing })
}

/// Declarative environment description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticEnvironment {
    pub platform: Platform,
    pub apis: HashSet<MediaApi>,
}

impl StaticEnvironment {
    pub fn new(platform: Platform, apis: impl IntoIterator<Item = MediaApi>) -> Self {
        Self {
            platform,
            apis: apis.into_iter().collect(),
        }
    }

    /// A current evergreen browser on the given platform
    pub fn modern_browser(platform: Platform) -> Self {
        let mut apis = vec![
            MediaApi::Promises,
            MediaApi::TypedArrays,
            MediaApi::MediaSource,
            MediaApi::EncryptedMedia,
        ];
        if platform.is_apple_webkit() {
            apis.push(MediaApi::NativeHls);
        }
        Self::new(platform, apis)
    }

    /// Remove an API, e.g. to model a locked-down webview
    pub fn without(mut self, api: MediaApi) -> Self {
        self.apis.remove(&api);
        self
    }
}

impl MediaEnvironment for StaticEnvironment {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn supports(&self, api: MediaApi) -> bool {
        self.apis.contains(&api)
    }
}
