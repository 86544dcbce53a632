//! Host platform detection
//!
//! DRM key-system selection only distinguishes Apple WebKit (FairPlay) from
//! everything else (Widevine). Supporting another DRM-relevant platform
//! means adding a variant and handling it at every `match`.

use serde::{Deserialize, Serialize};

/// Platform family relevant to DRM selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    /// Safari and every iOS/iPadOS browser (all WebKit)
    AppleWebKit,
    /// Blink, Gecko and anything unrecognised
    Other,
}

/// User-agent tokens that rule out Apple WebKit even when `AppleWebKit` is present
const NON_WEBKIT_TOKENS: &[&str] = &["chrome/", "chromium/", "edg/", "edge/", "opr/", "trident/"];

impl Platform {
    /// Classify a user-agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();

        let webkit = ua.contains("applewebkit/");
        let safari = ua.contains("safari/");
        let blink_or_legacy = NON_WEBKIT_TOKENS.iter().any(|token| ua.contains(token));

        if webkit && safari && !blink_or_legacy {
            Platform::AppleWebKit
        } else {
            Platform::Other
        }
    }

    pub fn is_apple_webkit(&self) -> bool {
        matches!(self, Platform::AppleWebKit)
    }
}

impl From<bool> for Platform {
    fn from(is_apple_webkit: bool) -> Self {
        if is_apple_webkit {
            Platform::AppleWebKit
        } else {
            Platform::Other
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::AppleWebKit => write!(f, "apple-webkit"),
            Platform::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "apple-webkit" | "safari" | "webkit" => Ok(Platform::AppleWebKit),
            "other" => Ok(Platform::Other),
            _ => Err(crate::Error::InvalidConfig(format!("unknown platform: {s}"))),
        }
    }
}
