//! Player configuration supplied by the host

use crate::drm::DrmSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Seek bar colours passed to the engine's UI overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekBarColors {
    pub base: String,
    pub buffered: String,
    pub played: String,
}

impl Default for SeekBarColors {
    fn default() -> Self {
        Self {
            base: "rgba(255,255,255,.2)".to_string(),
            buffered: "rgba(255,255,255,.4)".to_string(),
            played: "rgb(255,0,0)".to_string(),
        }
    }
}

/// Minimal overlay configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayConfig {
    pub seek_bar_colors: SeekBarColors,
}

/// Host-side player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerConfig {
    /// `autoplay` attribute on the display element
    pub autoplay: bool,
    /// `muted` attribute on the display element
    pub muted: bool,
    /// Event names observed in addition to the defaults
    pub extra_events: Vec<String>,
    pub overlay: OverlayConfig,
    pub drm: DrmSettings,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            muted: false,
            extra_events: Vec::new(),
            overlay: OverlayConfig::default(),
            drm: DrmSettings::default(),
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.drm.validate()?;

        let colors = &self.overlay.seek_bar_colors;
        if [&colors.base, &colors.buffered, &colors.played]
            .iter()
            .any(|c| c.trim().is_empty())
        {
            return Err(Error::InvalidConfig("seek bar colours must not be empty".into()));
        }

        if let Some(name) = self.extra_events.iter().find(|n| n.trim().is_empty()) {
            return Err(Error::InvalidConfig(format!("invalid event name: {name:?}")));
        }

        Ok(())
    }
}

/// Element attributes applied for each load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttributes {
    pub poster_url: Option<String>,
    pub autoplay: bool,
    pub muted: bool,
}

/// Parse a host-supplied playback position in whole seconds (e.g. `"42"`)
///
/// A fractional part is dropped, so `"42.9"` seeks to 42 s.
pub fn parse_position(input: &str) -> Result<Duration> {
    let seconds: f64 = input
        .trim()
        .parse()
        .map_err(|_| Error::InvalidPosition(input.to_string()))?;

    Duration::try_from_secs_f64(seconds.trunc()).map_err(|_| Error::InvalidPosition(input.to_string()))
}
