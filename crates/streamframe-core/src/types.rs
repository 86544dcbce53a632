//! Core types for Streamframe

use crate::config::parse_position;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to play; replaced as a whole to trigger a reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSource {
    pub manifest_url: String,
    pub key_id: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub initial_position: Option<Duration>,
}

impl PlaybackSource {
    pub fn new(manifest_url: impl Into<String>, key_id: impl Into<String>) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            key_id: key_id.into(),
            poster_url: None,
            initial_position: None,
        }
    }

    pub fn with_poster(mut self, poster_url: impl Into<String>) -> Self {
        self.poster_url = Some(poster_url.into());
        self
    }

    pub fn with_initial_position(mut self, position: Duration) -> Self {
        self.initial_position = Some(position);
        self
    }

    /// Set the start position from a host string such as `"42"`
    pub fn with_initial_position_str(self, position: &str) -> Result<Self> {
        Ok(self.with_initial_position(parse_position(position)?))
    }
}

/// Text track exposed by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTrack {
    pub id: u64,
    pub language: String,
    pub kind: String,
    pub label: Option<String>,
}

impl TextTrack {
    pub fn new(id: u64, language: impl Into<String>) -> Self {
        Self {
            id,
            language: language.into(),
            kind: "subtitle".to_string(),
            label: None,
        }
    }
}

/// Lifecycle controller states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// No engine, or the engine has been destroyed
    Uninitialized,
    /// Engine constructed and DRM-configured, nothing loaded
    Ready,
    /// A manifest load is in flight
    Loading,
    /// Content loaded
    Loaded,
}

impl ControllerState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: ControllerState) -> bool {
        use ControllerState::*;
        matches!(
            (self, target),
            (Uninitialized, Ready) |
            (Ready, Loading) | (Loaded, Loading) | (Loading, Loading) |
            (Loading, Loaded) | (Loading, Ready) |
            (Ready, Uninitialized) | (Loading, Uninitialized) | (Loaded, Uninitialized)
        )
    }
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Uninitialized => write!(f, "uninitialized"),
            ControllerState::Ready => write!(f, "ready"),
            ControllerState::Loading => write!(f, "loading"),
            ControllerState::Loaded => write!(f, "loaded"),
        }
    }
}

/// How a load attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Content loaded and playback started
    Loaded,
    /// A newer load started before this one settled; its result was discarded
    Superseded,
    /// The requested source is already active
    Unchanged,
}
