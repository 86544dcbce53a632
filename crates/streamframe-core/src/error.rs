//! Error types for Streamframe Core

use crate::capability::MediaApi;
use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Environment errors
    #[error("Environment unsupported: missing {}", format_apis(.missing))]
    EnvironmentUnsupported { missing: Vec<MediaApi> },

    // Manifest errors
    #[error("Failed to load manifest {url}: {cause}")]
    ManifestLoad { url: String, cause: String },

    // License exchange errors
    #[error("License exchange failed: {0}")]
    LicenseExchange(String),

    #[error("License payload is not valid base64: {0}")]
    LicenseBase64(#[from] base64::DecodeError),

    #[error("License payload is not valid UTF-8: {0}")]
    LicenseUtf8(#[from] std::string::FromUtf8Error),

    // Configuration errors
    #[error("Server certificate required for {key_system} but none is configured")]
    MissingCertificate { key_system: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid playback position: {0:?}")]
    InvalidPosition(String),

    // Controller errors
    #[error("Invalid controller state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Player engine error: {0}")]
    Engine(String),

    // Internal errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error taxonomy surfaced to hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fatal, raised before any player resource exists
    Environment,
    /// Recoverable at the handle level
    ManifestLoad,
    /// Malformed license payload, routed to the engine's error channel
    LicenseExchange,
    /// Invalid or missing configuration
    Configuration,
    Internal,
}

impl Error {
    /// Create a license exchange error
    pub fn license(msg: impl Into<String>) -> Self {
        Error::LicenseExchange(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::EnvironmentUnsupported { .. } => ErrorCategory::Environment,
            Error::ManifestLoad { .. } => ErrorCategory::ManifestLoad,
            Error::LicenseExchange(_) | Error::LicenseBase64(_) | Error::LicenseUtf8(_) => {
                ErrorCategory::LicenseExchange
            }
            Error::MissingCertificate { .. }
            | Error::InvalidConfig(_)
            | Error::InvalidPosition(_) => ErrorCategory::Configuration,
            Error::InvalidStateTransition { .. }
            | Error::Engine(_)
            | Error::Json(_)
            | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Returns true if the handle stays usable after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ManifestLoad { .. } | Error::InvalidPosition(_))
    }

    /// Returns true if this error must abort initialization
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::EnvironmentUnsupported { .. })
    }

    /// Returns the error code reported to hosts
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::EnvironmentUnsupported { .. } => "ENV_UNSUPPORTED",
            Error::ManifestLoad { .. } => "MANIFEST_LOAD",
            Error::LicenseExchange(_) => "LICENSE_EXCHANGE",
            Error::LicenseBase64(_) => "LICENSE_BASE64",
            Error::LicenseUtf8(_) => "LICENSE_UTF8",
            Error::MissingCertificate { .. } => "MISSING_CERTIFICATE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::InvalidPosition(_) => "INVALID_POSITION",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::Engine(_) => "ENGINE",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}

fn format_apis(apis: &[MediaApi]) -> String {
    apis.iter()
        .map(|api| api.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
