//! Seam to the third-party media player engine
//!
//! Manifest parsing, ABR, decryption and rendering all happen behind this
//! trait. Only the lifecycle controller calls its mutating methods.

use crate::config::{ElementAttributes, OverlayConfig};
use crate::drm::DrmProfile;
use crate::error::Result;
use crate::license::NetworkFilter;
use crate::types::TextTrack;
use async_trait::async_trait;
use std::sync::Arc;

/// Cause reported by the engine when a manifest load is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub cause: String,
}

impl LoadFailure {
    pub fn new(cause: impl Into<String>) -> Self {
        Self { cause: cause.into() }
    }
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cause)
    }
}

/// Adaptive-streaming player engine bound to one display element
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Apply the DRM key-system configuration
    fn configure_drm(&self, profile: &DrmProfile) -> Result<()>;

    /// Configure the engine's UI overlay
    fn configure_overlay(&self, overlay: &OverlayConfig) -> Result<()>;

    /// Set poster/autoplay/muted on the display element
    fn apply_element_attributes(&self, attributes: &ElementAttributes);

    /// Register request and response filters on the networking layer
    fn register_network_filter(&self, filter: Arc<dyn NetworkFilter>);

    /// Fetch and parse a manifest and prepare playback
    async fn load(&self, manifest_url: &str) -> std::result::Result<(), LoadFailure>;

    /// Tear down loaded content; cancels an in-flight load
    fn unload(&self);

    fn text_tracks(&self) -> Vec<TextTrack>;

    fn select_text_track(&self, track: &TextTrack);

    fn set_text_track_visibility(&self, visible: bool);

    /// Start playback on the display element
    fn play(&self);

    /// Media position in seconds
    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    /// Release every engine resource
    fn destroy(&self);
}
