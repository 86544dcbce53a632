//! License protocol filter
//!
//! FairPlay license servers of this deployment do not accept the raw SPC
//! (server playback context) the CDM produces, and answer with a CKC
//! (content key context) wrapped in `<ckc>` tags. The filter adapts both
//! directions on the engine's networking pipeline:
//!
//! ```text
//! request:  SPC bytes ──base64──▶ "spc=<b64>"  (application/x-www-form-urlencoded)
//! response: "<ckc><b64></ckc>" ──trim/unwrap/base64──▶ CKC bytes
//! ```
//!
//! Only traffic tagged [`RequestType::License`] is touched.

use crate::error::Result;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Content type expected by the license server
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

const CONTENT_TYPE: &str = "Content-Type";
const SPC_FIELD: &str = "spc=";
const CKC_OPEN: &str = "<ckc>";
const CKC_CLOSE: &str = "</ckc>";

/// Standard alphabet, padding on encode, optional on decode
const B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Engine request type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Manifest,
    Segment,
    License,
    App,
    Timing,
    ServerCertificate,
    Key,
    Ads,
    ContentSteering,
    Other(u32),
}

impl RequestType {
    /// Map the engine's numeric request type
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => RequestType::Manifest,
            1 => RequestType::Segment,
            2 => RequestType::License,
            3 => RequestType::App,
            4 => RequestType::Timing,
            5 => RequestType::ServerCertificate,
            6 => RequestType::Key,
            7 => RequestType::Ads,
            8 => RequestType::ContentSteering,
            other => RequestType::Other(other),
        }
    }

    pub fn is_license(&self) -> bool {
        matches!(self, RequestType::License)
    }
}

/// Outgoing request as seen by network filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseRequest {
    pub request_type: Option<RequestType>,
    pub uris: Vec<String>,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl LicenseRequest {
    pub fn new(request_type: RequestType, body: impl Into<Bytes>) -> Self {
        Self {
            request_type: Some(request_type),
            body: body.into(),
            ..Default::default()
        }
    }

    fn is_license(&self) -> bool {
        self.request_type.is_some_and(|t| t.is_license())
    }
}

/// Incoming response as seen by network filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseResponse {
    pub request_type: Option<RequestType>,
    pub uri: String,
    pub headers: HashMap<String, String>,
    pub data: Bytes,
}

impl LicenseResponse {
    pub fn new(request_type: RequestType, data: impl Into<Bytes>) -> Self {
        Self {
            request_type: Some(request_type),
            data: data.into(),
            ..Default::default()
        }
    }

    fn is_license(&self) -> bool {
        self.request_type.is_some_and(|t| t.is_license())
    }
}

/// Hook on the engine's networking pipeline
///
/// An `Err` is reported through the engine's own error channel and fails
/// the exchange.
pub trait NetworkFilter: Send + Sync {
    fn filter_request(&self, request: &mut LicenseRequest) -> Result<()>;

    fn filter_response(&self, response: &mut LicenseResponse) -> Result<()>;
}

/// SPC/CKC adaptation for FairPlay license servers
#[derive(Debug, Clone, Copy, Default)]
pub struct FairPlayLicenseFilter;

impl NetworkFilter for FairPlayLicenseFilter {
    fn filter_request(&self, request: &mut LicenseRequest) -> Result<()> {
        if !request.is_license() {
            return Ok(());
        }

        let body = encode_spc_body(&request.body);
        request.headers.insert(CONTENT_TYPE.to_string(), FORM_URLENCODED.to_string());
        debug!(spc_bytes = request.body.len(), body_bytes = body.len(), "SPC wrapped");
        request.body = Bytes::from(body);

        Ok(())
    }

    fn filter_response(&self, response: &mut LicenseResponse) -> Result<()> {
        if !response.is_license() {
            return Ok(());
        }

        let text = String::from_utf8(response.data.to_vec())?;
        let ckc = decode_ckc_body(&text)?;
        debug!(response_bytes = response.data.len(), ckc_bytes = ckc.len(), "CKC unwrapped");
        response.data = Bytes::from(ckc);

        Ok(())
    }
}

/// Form body carrying a base64 SPC
pub fn encode_spc_body(spc: &[u8]) -> String {
    format!("{SPC_FIELD}{}", B64.encode(spc))
}

/// Recover the SPC from a form body produced by [`encode_spc_body`]
pub fn decode_spc_body(body: &str) -> Result<Vec<u8>> {
    let encoded = body.strip_prefix(SPC_FIELD).ok_or_else(|| {
        crate::Error::license(format!("request body does not start with {SPC_FIELD:?}"))
    })?;
    Ok(B64.decode(encoded)?)
}

/// Trim and remove a `<ckc>...</ckc>` wrapper when both tags are present
pub fn strip_ckc_wrapper(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.strip_prefix(CKC_OPEN).and_then(|s| s.strip_suffix(CKC_CLOSE)) {
        Some(inner) => inner,
        None => {
            trace!("No <ckc> wrapper, passing body through");
            trimmed
        }
    }
}

/// Decode a CKC response body into raw key context bytes
pub fn decode_ckc_body(text: &str) -> Result<Vec<u8>> {
    let encoded: String = strip_ckc_wrapper(text)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    Ok(B64.decode(encoded)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn b64(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    #[test]
    fn test_request_filter_wraps_spc() {
        let spc = vec![0u8, 1, 2, 250, 251, 252, 253, 254, 255];
        let mut request = LicenseRequest::new(RequestType::License, spc.clone());

        FairPlayLicenseFilter.filter_request(&mut request).unwrap();

        assert_eq!(request.headers.get("Content-Type").map(String::as_str), Some(FORM_URLENCODED));
        let body = std::str::from_utf8(&request.body).unwrap();
        assert_eq!(body, format!("spc={}", b64(&spc)));
        assert_eq!(decode_spc_body(body).unwrap(), spc);
    }

    #[test]
    fn test_request_filter_empty_payload() {
        let mut request = LicenseRequest::new(RequestType::License, Vec::new());
        FairPlayLicenseFilter.filter_request(&mut request).unwrap();
        assert_eq!(&request.body[..], b"spc=");
    }

    #[test]
    fn test_non_license_traffic_untouched() {
        let mut request = LicenseRequest::new(RequestType::Segment, &b"segment"[..]);
        let before = request.clone();
        FairPlayLicenseFilter.filter_request(&mut request).unwrap();
        assert_eq!(request, before);

        let mut response = LicenseResponse::new(RequestType::Manifest, &b"<MPD/>"[..]);
        let before = response.clone();
        FairPlayLicenseFilter.filter_response(&mut response).unwrap();
        assert_eq!(response, before);

        let mut untagged = LicenseResponse {
            data: Bytes::from_static(b"not base64 !!"),
            ..Default::default()
        };
        assert!(FairPlayLicenseFilter.filter_response(&mut untagged).is_ok());
    }

    #[test]
    fn test_response_filter_unwraps_ckc() {
        let ckc = b"content key context".to_vec();
        let body = format!("  \n<ckc>{}</ckc>\r\n", b64(&ckc));
        let mut response = LicenseResponse::new(RequestType::License, body.into_bytes());

        FairPlayLicenseFilter.filter_response(&mut response).unwrap();
        assert_eq!(response.data.to_vec(), ckc);
    }

    #[test]
    fn test_response_without_wrapper_still_decoded() {
        let ckc = b"bare".to_vec();
        assert_eq!(decode_ckc_body(&b64(&ckc)).unwrap(), ckc);

        // One tag only: nothing is stripped, so the tag breaks decoding
        let half = format!("<ckc>{}", b64(&ckc));
        assert_eq!(strip_ckc_wrapper(&half), half);
        assert!(matches!(decode_ckc_body(&half), Err(Error::LicenseBase64(_))));
    }

    #[test]
    fn test_ckc_with_missing_padding_and_line_breaks() {
        assert_eq!(decode_ckc_body("<ckc>AQID\nBA</ckc>").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_response_errors_propagate() {
        let mut not_utf8 = LicenseResponse::new(RequestType::License, vec![0xc3, 0x28]);
        assert!(matches!(
            FairPlayLicenseFilter.filter_response(&mut not_utf8),
            Err(Error::LicenseUtf8(_))
        ));

        let mut not_base64 = LicenseResponse::new(RequestType::License, &b"<ckc>@@@</ckc>"[..]);
        let result = FairPlayLicenseFilter.filter_response(&mut not_base64);
        assert!(matches!(result, Err(Error::LicenseBase64(_))));
        // Body is left as received, never replaced with empty content
        assert_eq!(&not_base64.data[..], b"<ckc>@@@</ckc>");
    }

    #[test]
    fn test_request_type_codes() {
        assert_eq!(RequestType::from_code(2), RequestType::License);
        assert_eq!(RequestType::from_code(0), RequestType::Manifest);
        assert_eq!(RequestType::from_code(42), RequestType::Other(42));
    }
}
