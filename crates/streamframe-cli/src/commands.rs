//! CLI command implementations

use crate::output::{emit, fail, field, heading, pass};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use streamframe_core::license::{decode_ckc_body, encode_spc_body, strip_ckc_wrapper};
use streamframe_core::{
    event_names, resolve_drm_profile, DrmResolver, LicenseRequest, LicenseResponse, NetworkFilter, Platform,
    PlayerConfig, RequestType,
};
use tracing::{debug, info};
use url::Url;

#[derive(Serialize)]
struct DetectReport {
    platform: Platform,
    key_system: &'static str,
    license_filter: bool,
}

#[derive(Serialize)]
struct CkcReport {
    wrapped: bool,
    ckc_bytes: usize,
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct ExchangeReport {
    license_url: String,
    status: u16,
    spc_bytes: usize,
    ckc_bytes: usize,
}

#[derive(Serialize)]
struct ValidationReport {
    valid: bool,
    error: Option<String>,
}

/// Detect the platform family for a user agent
pub fn detect(user_agent: &str, format: &str) -> anyhow::Result<()> {
    let platform = Platform::from_user_agent(user_agent);
    let profile = resolve_drm_profile(platform, "detect", None);

    let report = DetectReport {
        platform,
        key_system: profile.key_system(),
        license_filter: profile.requires_license_filter(),
    };

    emit(&report, format, |r| {
        heading("Platform Detection");
        field("Platform", r.platform);
        field("Key system", r.key_system);
        field("License filter", r.license_filter);
    })
}

/// Print the engine DRM configuration
pub fn profile(
    platform: &str,
    key_id: &str,
    config: Option<PathBuf>,
    certificate: Option<PathBuf>,
    format: &str,
) -> anyhow::Result<()> {
    let platform: Platform = platform.parse()?;
    let mut config = load_config(config.as_deref())?;

    if let Some(path) = certificate {
        let der = std::fs::read(&path).with_context(|| format!("reading certificate {}", path.display()))?;
        debug!(bytes = der.len(), "Loaded server certificate");
        config.drm = config.drm.with_certificate(der);
    }

    let profile = DrmResolver::new(config.drm).resolve(platform, key_id)?;
    let engine_config = profile.to_engine_config();

    emit(&engine_config, format, |engine_config| {
        heading("DRM Profile");
        field("Key system", profile.key_system());
        field("License server", profile.license_server_url());
        field(
            "Certificate",
            format!("{} bytes", profile.server_certificate().map_or(0, |cert| cert.len())),
        );
        println!();
        println!("{}", serde_json::to_string_pretty(engine_config).unwrap_or_default());
    })
}

/// Encode a raw SPC as a form body
pub fn spc(input: &Path, format: &str) -> anyhow::Result<()> {
    let spc = std::fs::read(input).with_context(|| format!("reading SPC {}", input.display()))?;
    let body = encode_spc_body(&spc);

    emit(&body, format, |b| println!("{b}"))
}

/// Decode a CKC response body
pub fn ckc(input: &Path, output: Option<PathBuf>, format: &str) -> anyhow::Result<()> {
    let raw = std::fs::read(input).with_context(|| format!("reading response {}", input.display()))?;
    let text = String::from_utf8(raw).context("response body is not UTF-8")?;

    let wrapped = strip_ckc_wrapper(&text).len() != text.trim().len();
    let ckc = decode_ckc_body(&text)?;

    if let Some(path) = &output {
        std::fs::write(path, &ckc).with_context(|| format!("writing CKC {}", path.display()))?;
        info!(path = %path.display(), bytes = ckc.len(), "CKC written");
    }

    let report = CkcReport {
        wrapped,
        ckc_bytes: ckc.len(),
        output,
    };

    emit(&report, format, |r| {
        heading("CKC");
        field("<ckc> wrapper", r.wrapped);
        field("Decoded", format!("{} bytes", r.ckc_bytes));
        if let Some(path) = &r.output {
            field("Written to", path.display());
        }
    })
}

/// Run a FairPlay license exchange against the configured server
pub async fn exchange(
    key_id: &str,
    spc: &Path,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    format: &str,
) -> anyhow::Result<()> {
    let config = load_config(config.as_deref())?;
    let profile = DrmResolver::new(config.drm).resolve(Platform::AppleWebKit, key_id)?;
    let filter = profile
        .license_filter()
        .context("FairPlay profile has no license filter")?;
    let license_url = Url::parse(profile.license_server_url())?;

    let spc = std::fs::read(spc).with_context(|| format!("reading SPC {}", spc.display()))?;
    let spc_bytes = spc.len();

    let mut request = LicenseRequest::new(RequestType::License, spc);
    request.uris.push(license_url.to_string());
    filter.filter_request(&mut request)?;

    info!(url = %license_url, bytes = request.body.len(), "Sending license request");

    let client = reqwest::Client::new();
    let mut builder = client.post(license_url.clone()).body(request.body.clone());
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let resp = builder.send().await?;
    let status = resp.status();
    let data = resp.bytes().await?;
    debug!(status = status.as_u16(), bytes = data.len(), "License response received");

    if !status.is_success() {
        fail(&format!("license server returned {status}"));
        anyhow::bail!("license exchange failed with HTTP {status}");
    }

    let mut response = LicenseResponse::new(RequestType::License, data);
    response.uri = license_url.to_string();
    filter.filter_response(&mut response)?;

    if let Some(path) = &output {
        std::fs::write(path, &response.data).with_context(|| format!("writing CKC {}", path.display()))?;
    }

    let report = ExchangeReport {
        license_url: license_url.to_string(),
        status: status.as_u16(),
        spc_bytes,
        ckc_bytes: response.data.len(),
    };

    emit(&report, format, |r| {
        pass("License exchange");
        field("Server", &r.license_url);
        field("HTTP status", r.status);
        field("SPC", format!("{} bytes", r.spc_bytes));
        field("CKC", format!("{} bytes", r.ckc_bytes));
    })
}

/// List the observed media events
pub fn events(extra: &[String], format: &str) -> anyhow::Result<()> {
    let names = event_names(extra);

    emit(&names, format, |names| {
        heading("Observed events");
        for (i, name) in names.iter().enumerate() {
            println!("  {}. {}", i + 1, name);
        }
    })
}

/// Validate a configuration file
pub fn validate_config(path: &Path, format: &str) -> anyhow::Result<()> {
    let result = PlayerConfig::from_file(path).and_then(|c| c.validate());

    let report = ValidationReport {
        valid: result.is_ok(),
        error: result.as_ref().err().map(|e| e.to_string()),
    };

    emit(&report, format, |r| match &r.error {
        None => pass(&format!("{} is valid", path.display())),
        Some(e) => fail(&format!("{}: {}", path.display(), e)),
    })?;

    if let Err(e) = result {
        anyhow::bail!("invalid configuration ({})", e.error_code());
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PlayerConfig> {
    let config = match path {
        Some(path) => PlayerConfig::from_file(path)?,
        None => PlayerConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
