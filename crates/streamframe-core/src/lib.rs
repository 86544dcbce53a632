//! Streamframe Core - Embedded Adaptive-Streaming Player
//!
//! Adapts a third-party player engine to a host application:
//! - Capability check before any player resource exists
//! - DRM profile resolution (Widevine / FairPlay)
//! - FairPlay license request/response filtering (SPC / CKC)
//! - Player lifecycle control (load, unload, reload, seek)
//! - De-duplicated media event stream for the host
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Streamframe Core                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │  Capability  │  │     DRM      │  │   License    │          │
//! │  │    Check     │  │   Resolver   │  │    Filter    │          │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘          │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Player    │                              │
//! │                    │ Controller  │──────▶ MediaEngine           │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐                              │
//! │  │ Event Stream │─▶│  Notifier   │──────▶ host                  │
//! │  │   Adapter    │  └─────────────┘                              │
//! │  └──────────────┘                                               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller, event adapter and notifier need the `runtime` feature
//! (tokio). Everything else builds for `wasm32-unknown-unknown`.

pub mod capability;
pub mod config;
pub mod drm;
pub mod error;
pub mod events;
pub mod license;
pub mod platform;
pub mod types;

#[cfg(feature = "runtime")]
pub mod controller;
#[cfg(feature = "runtime")]
pub mod engine;
#[cfg(feature = "runtime")]
pub mod notify;

pub use capability::{check_support, ensure_supported, MediaApi, MediaEnvironment, StaticEnvironment};
pub use config::{parse_position, ElementAttributes, OverlayConfig, PlayerConfig, SeekBarColors};
pub use drm::{
    resolve_drm_profile, CertificatePolicy, DrmProfile, DrmResolver, DrmSettings, FairPlayProfile, Robustness,
    WidevineProfile,
};
pub use error::{Error, ErrorCategory, Result};
pub use events::{event_names, DistinctUntilChanged, MediaEvent, DEFAULT_EVENTS};
pub use license::{FairPlayLicenseFilter, LicenseRequest, LicenseResponse, NetworkFilter, RequestType};
pub use platform::Platform;
pub use types::{ControllerState, LoadOutcome, PlaybackSource, TextTrack};

#[cfg(feature = "runtime")]
pub use controller::PlayerController;
#[cfg(feature = "runtime")]
pub use engine::{LoadFailure, MediaEngine};
#[cfg(feature = "runtime")]
pub use events::{EventSink, EventStreamAdapter, EventSubscription, ListenerId, MediaEventTarget};
#[cfg(feature = "runtime")]
pub use notify::{HandleId, HostEvent, Notification, NotificationReceiver, Notifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version
pub fn init() {
    tracing::info!(version = VERSION, "Streamframe Core initialized");
}
