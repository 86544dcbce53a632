//! DRM configuration resolver
//!
//! Selects a key system from the host platform and assembles the license
//! server and certificate configuration handed to the engine:
//! - Widevine (Chrome, Firefox, Edge, Android and anything unrecognised)
//! - FairPlay (Safari and every iOS browser)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │   Platform   │────▶│ DrmResolver  │────▶│    DrmProfile    │
//! └──────────────┘     │  (settings)  │     │ Widevine|FairPlay│
//!                      └──────────────┘     └────────┬─────────┘
//!                                          ┌─────────┴─────────┐
//!                                          ▼                   ▼
//!                                   engine config       license filter
//! ```

use crate::error::{Error, Result};
use crate::license::{FairPlayLicenseFilter, NetworkFilter};
use crate::platform::Platform;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Widevine key-system identifier
pub const KEY_SYSTEM_WIDEVINE: &str = "com.widevine.alpha";

/// FairPlay key-system identifier
pub const KEY_SYSTEM_FAIRPLAY: &str = "com.apple.fps.1_0";

/// Placeholder substituted with the content key id
pub const KEY_ID_PLACEHOLDER: &str = "{key_id}";

/// Default license endpoint template
pub const DEFAULT_LICENSE_URL_TEMPLATE: &str = "https://license.example.com/drm/?id={key_id}";

/// Default preferred audio language on FairPlay
pub const DEFAULT_AUDIO_LANGUAGE: &str = "en-US";

/// Requested security tier for decryption and decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Robustness {
    #[default]
    SwSecureCrypto,
    SwSecureDecode,
    HwSecureCrypto,
    HwSecureDecode,
    HwSecureAll,
}

impl Robustness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Robustness::SwSecureCrypto => "SW_SECURE_CRYPTO",
            Robustness::SwSecureDecode => "SW_SECURE_DECODE",
            Robustness::HwSecureCrypto => "HW_SECURE_CRYPTO",
            Robustness::HwSecureDecode => "HW_SECURE_DECODE",
            Robustness::HwSecureAll => "HW_SECURE_ALL",
        }
    }
}

impl std::fmt::Display for Robustness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when FairPlay is selected but no certificate is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificatePolicy {
    /// Continue with an empty certificate
    #[default]
    Lenient,
    /// Refuse to build the profile
    Strict,
}

/// Settings injected into the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DrmSettings {
    /// License server URL with a `{key_id}` placeholder
    pub license_url_template: String,
    /// Preferred audio language (FairPlay)
    pub preferred_audio_language: String,
    /// Audio and video robustness (Widevine)
    pub robustness: Robustness,
    /// FairPlay application certificate, base64 in config files
    #[serde(with = "certificate_base64")]
    pub server_certificate: Option<Bytes>,
    pub certificate_policy: CertificatePolicy,
}

impl Default for DrmSettings {
    fn default() -> Self {
        Self {
            license_url_template: DEFAULT_LICENSE_URL_TEMPLATE.to_string(),
            preferred_audio_language: DEFAULT_AUDIO_LANGUAGE.to_string(),
            robustness: Robustness::default(),
            server_certificate: None,
            certificate_policy: CertificatePolicy::default(),
        }
    }
}

impl DrmSettings {
    /// Attach the FairPlay server certificate
    pub fn with_certificate(mut self, certificate: impl Into<Bytes>) -> Self {
        self.server_certificate = Some(certificate.into());
        self
    }

    pub fn with_policy(mut self, policy: CertificatePolicy) -> Self {
        self.certificate_policy = policy;
        self
    }

    /// License server URL for a key id
    pub fn license_url(&self, key_id: &str) -> String {
        self.license_url_template.replace(KEY_ID_PLACEHOLDER, key_id)
    }

    /// Check the template and language
    pub fn validate(&self) -> Result<()> {
        if !self.license_url_template.contains(KEY_ID_PLACEHOLDER) {
            return Err(Error::InvalidConfig(format!(
                "license URL template must contain {KEY_ID_PLACEHOLDER}: {}",
                self.license_url_template
            )));
        }

        Url::parse(&self.license_url("key"))
            .map_err(|e| Error::InvalidConfig(format!("license URL template: {e}")))?;

        if self.preferred_audio_language.trim().is_empty() {
            return Err(Error::InvalidConfig("preferred audio language is empty".into()));
        }

        Ok(())
    }
}

/// Widevine profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidevineProfile {
    pub license_server_url: String,
    pub video_robustness: Robustness,
    pub audio_robustness: Robustness,
    pub server_certificate: Option<Bytes>,
}

/// FairPlay profile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairPlayProfile {
    pub license_server_url: String,
    pub server_certificate: Bytes,
    pub preferred_audio_language: String,
}

/// DRM key-system profile, fixed for the lifetime of a player handle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "system", rename_all = "snake_case")]
pub enum DrmProfile {
    Widevine(WidevineProfile),
    FairPlay(FairPlayProfile),
}

impl DrmProfile {
    /// Key-system identifier understood by the engine
    pub fn key_system(&self) -> &'static str {
        match self {
            DrmProfile::Widevine(_) => KEY_SYSTEM_WIDEVINE,
            DrmProfile::FairPlay(_) => KEY_SYSTEM_FAIRPLAY,
        }
    }

    pub fn license_server_url(&self) -> &str {
        match self {
            DrmProfile::Widevine(p) => &p.license_server_url,
            DrmProfile::FairPlay(p) => &p.license_server_url,
        }
    }

    pub fn server_certificate(&self) -> Option<&Bytes> {
        match self {
            DrmProfile::Widevine(p) => p.server_certificate.as_ref(),
            DrmProfile::FairPlay(p) => Some(&p.server_certificate),
        }
    }

    /// Whether license traffic must go through a protocol filter
    pub fn requires_license_filter(&self) -> bool {
        matches!(self, DrmProfile::FairPlay(_))
    }

    /// The filter to register on the engine's networking layer, if any
    pub fn license_filter(&self) -> Option<Arc<dyn NetworkFilter>> {
        match self {
            DrmProfile::FairPlay(_) => Some(Arc::new(FairPlayLicenseFilter)),
            DrmProfile::Widevine(_) => None,
        }
    }

    /// Engine configuration object (`drm.servers`, `drm.advanced`, ...)
    ///
    /// Certificates are rendered as arrays of byte values.
    pub fn to_engine_config(&self) -> serde_json::Value {
        let key_system = self.key_system();
        match self {
            DrmProfile::Widevine(p) => {
                let mut advanced = serde_json::json!({
                    "videoRobustness": p.video_robustness.as_str(),
                    "audioRobustness": p.audio_robustness.as_str(),
                });
                if let Some(cert) = &p.server_certificate {
                    advanced["serverCertificate"] = serde_json::json!(cert.to_vec());
                }
                serde_json::json!({
                    "drm": {
                        "servers": { key_system: p.license_server_url },
                        "advanced": { key_system: advanced },
                    }
                })
            }
            DrmProfile::FairPlay(p) => serde_json::json!({
                "preferredAudioLanguage": p.preferred_audio_language,
                "drm": {
                    "servers": { key_system: p.license_server_url },
                    "advanced": {
                        key_system: { "serverCertificate": p.server_certificate.to_vec() }
                    },
                }
            }),
        }
    }
}

/// Builds DRM profiles from injected settings
#[derive(Debug, Clone, Default)]
pub struct DrmResolver {
    settings: DrmSettings,
}

impl DrmResolver {
    pub fn new(settings: DrmSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DrmSettings {
        &self.settings
    }

    /// Select and assemble the profile for a platform
    pub fn resolve(&self, platform: Platform, key_id: &str) -> Result<DrmProfile> {
        let certificate = match platform {
            Platform::AppleWebKit => self.fairplay_certificate()?,
            Platform::Other => Bytes::new(),
        };

        let profile = self.assemble(platform, key_id, certificate);

        info!(
            %platform,
            key_system = profile.key_system(),
            license_url = profile.license_server_url(),
            "DRM profile resolved"
        );

        Ok(profile)
    }

    fn fairplay_certificate(&self) -> Result<Bytes> {
        // An empty buffer is no certificate at all
        let configured = self.settings.server_certificate.as_ref().filter(|c| !c.is_empty());

        match (configured, self.settings.certificate_policy) {
            (Some(cert), _) => Ok(cert.clone()),
            (None, CertificatePolicy::Lenient) => {
                warn!(key_system = KEY_SYSTEM_FAIRPLAY, "No server certificate configured, using empty certificate");
                Ok(Bytes::new())
            }
            (None, CertificatePolicy::Strict) => Err(Error::MissingCertificate {
                key_system: KEY_SYSTEM_FAIRPLAY,
            }),
        }
    }

    fn assemble(&self, platform: Platform, key_id: &str, certificate: Bytes) -> DrmProfile {
        let license_server_url = self.settings.license_url(key_id);

        match platform {
            Platform::AppleWebKit => DrmProfile::FairPlay(FairPlayProfile {
                license_server_url,
                server_certificate: certificate,
                preferred_audio_language: self.settings.preferred_audio_language.clone(),
            }),
            Platform::Other => DrmProfile::Widevine(WidevineProfile {
                license_server_url,
                video_robustness: self.settings.robustness,
                audio_robustness: self.settings.robustness,
                server_certificate: None,
            }),
        }
    }
}

/// Resolve a profile with default settings
///
/// A missing FairPlay certificate falls back to an empty buffer.
pub fn resolve_drm_profile(platform: Platform, key_id: &str, certificate: Option<Bytes>) -> DrmProfile {
    DrmResolver::default().assemble(platform, key_id, certificate.unwrap_or_default())
}

mod certificate_base64 {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Bytes>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s.trim()).map(Bytes::from))
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apple_webkit_gets_fairplay() {
        let profile = resolve_drm_profile(Platform::AppleWebKit, "kid-42", Some(Bytes::from_static(b"cert")));
        match &profile {
            DrmProfile::FairPlay(p) => {
                assert_eq!(p.license_server_url, "https://license.example.com/drm/?id=kid-42");
                assert_eq!(p.server_certificate, Bytes::from_static(b"cert"));
                assert_eq!(p.preferred_audio_language, "en-US");
            }
            other => panic!("expected FairPlay, got {:?}", other),
        }
        assert_eq!(profile.key_system(), KEY_SYSTEM_FAIRPLAY);
        assert!(profile.requires_license_filter());
    }

    #[test]
    fn test_other_platform_gets_widevine() {
        let profile = resolve_drm_profile(Platform::Other, "kid-42", Some(Bytes::from_static(b"cert")));
        match &profile {
            DrmProfile::Widevine(p) => {
                assert!(p.license_server_url.contains("kid-42"));
                assert_eq!(p.video_robustness, Robustness::SwSecureCrypto);
                assert_eq!(p.audio_robustness, Robustness::SwSecureCrypto);
                assert!(p.server_certificate.is_none());
            }
            other => panic!("expected Widevine, got {:?}", other),
        }
        assert!(!profile.requires_license_filter());
        assert!(profile.license_filter().is_none());
    }

    #[test]
    fn test_key_id_substituted_verbatim() {
        for platform in [Platform::AppleWebKit, Platform::Other] {
            let profile = resolve_drm_profile(platform, "a b&c=d", None);
            assert!(profile.license_server_url().contains("a b&c=d"));
        }
    }

    #[test]
    fn test_missing_certificate_lenient_and_strict() {
        let lenient = DrmResolver::new(DrmSettings::default());
        let profile = lenient.resolve(Platform::AppleWebKit, "kid").unwrap();
        assert_eq!(profile.server_certificate(), Some(&Bytes::new()));

        let strict = DrmResolver::new(DrmSettings::default().with_policy(CertificatePolicy::Strict));
        assert!(matches!(
            strict.resolve(Platform::AppleWebKit, "kid"),
            Err(Error::MissingCertificate { key_system: KEY_SYSTEM_FAIRPLAY })
        ));

        // Widevine never needs one
        assert!(strict.resolve(Platform::Other, "kid").is_ok());
    }

    #[test]
    fn test_empty_certificate_counts_as_missing() {
        let settings: DrmSettings =
            serde_json::from_str(r#"{"serverCertificate":"","certificatePolicy":"strict"}"#).unwrap();
        assert_eq!(settings.server_certificate, Some(Bytes::new()));
        assert!(matches!(
            DrmResolver::new(settings).resolve(Platform::AppleWebKit, "kid"),
            Err(Error::MissingCertificate { .. })
        ));

        let strict = DrmSettings::default()
            .with_certificate(Vec::new())
            .with_policy(CertificatePolicy::Strict);
        assert!(DrmResolver::new(strict).resolve(Platform::AppleWebKit, "kid").is_err());

        let lenient = DrmResolver::new(DrmSettings::default().with_certificate(Vec::new()));
        let profile = lenient.resolve(Platform::AppleWebKit, "kid").unwrap();
        assert_eq!(profile.server_certificate(), Some(&Bytes::new()));
    }

    #[test]
    fn test_engine_config_shape() {
        let widevine = resolve_drm_profile(Platform::Other, "kid", None).to_engine_config();
        assert_eq!(
            widevine["drm"]["servers"]["com.widevine.alpha"],
            "https://license.example.com/drm/?id=kid"
        );
        assert_eq!(
            widevine["drm"]["advanced"]["com.widevine.alpha"]["videoRobustness"],
            "SW_SECURE_CRYPTO"
        );

        let fairplay =
            resolve_drm_profile(Platform::AppleWebKit, "kid", Some(Bytes::from_static(&[1, 2]))).to_engine_config();
        assert_eq!(fairplay["preferredAudioLanguage"], "en-US");
        assert_eq!(
            fairplay["drm"]["advanced"]["com.apple.fps.1_0"]["serverCertificate"],
            serde_json::json!([1, 2])
        );
    }

    #[test]
    fn test_settings_validation() {
        assert!(DrmSettings::default().validate().is_ok());

        let no_placeholder = DrmSettings {
            license_url_template: "https://license.example.com/drm/".into(),
            ..Default::default()
        };
        assert!(no_placeholder.validate().is_err());

        let not_a_url = DrmSettings {
            license_url_template: "license/{key_id}".into(),
            ..Default::default()
        };
        assert!(not_a_url.validate().is_err());
    }

    #[test]
    fn test_settings_certificate_from_base64() {
        let settings: DrmSettings = serde_json::from_str(
            r#"{"serverCertificate": "AQID", "certificatePolicy": "strict", "robustness": "HW_SECURE_ALL"}"#,
        )
        .unwrap();
        assert_eq!(settings.server_certificate, Some(Bytes::from_static(&[1, 2, 3])));
        assert_eq!(settings.certificate_policy, CertificatePolicy::Strict);
        assert_eq!(settings.robustness, Robustness::HwSecureAll);
        assert_eq!(settings.license_url_template, DEFAULT_LICENSE_URL_TEMPLATE);
    }
}
