//! Akamai HD manifest handling.
//!
//! Akamai serves the same stream as HDS under `/z/.../manifest.f4m` and as
//! HLS under `/i/.../master.m3u8`. Given either URL we emit the HDS
//! manifest as one format and parse the HLS master for the rest.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::hls::{self, HlsExtraction};
use super::provider::{FormatProtocol, MediaFormat};
use crate::http_client::MediaFetcher;

const HDCORE_SIGN: &str = "hdcore=3.7.0";

static UNSIGNED_PARAMS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:b=[\d,-]+|(?:__a__|attributes)=off|__b__=\d+)&?")
        .expect("invalid akamai param regex")
});
static HLS_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://[^/]+)/i/").expect("invalid akamai hls regex"));
static HDS_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://[^/]+)/z/").expect("invalid akamai hds regex"));

/// Drop bitrate-restricting parameters from unsigned manifest URLs.
///
/// Signed URLs (`hdnea=`) are returned untouched; editing them would
/// invalidate the token.
pub fn strip_unsigned_params(manifest_url: &str) -> String {
    if manifest_url.contains("hdnea=") {
        return manifest_url.to_string();
    }
    UNSIGNED_PARAMS_RE
        .replace_all(manifest_url, "")
        .trim_matches('?')
        .to_string()
}

/// HDS manifest URL for an Akamai stream, with the `hdcore` signature.
pub fn f4m_url(manifest_url: &str) -> String {
    let mut url = HLS_PATH_RE
        .replace(manifest_url, "$1/z/")
        .replace("/master.m3u8", "/manifest.f4m");
    if !url.contains("hdcore=") {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(HDCORE_SIGN);
    }
    url
}

/// HLS master playlist URL for an Akamai stream.
pub fn m3u8_url(manifest_url: &str) -> String {
    HDS_PATH_RE
        .replace(manifest_url, "$1/i/")
        .replace("/manifest.f4m", "/master.m3u8")
}

/// Formats for an Akamai-hosted stream.
///
/// The HDS manifest is listed as-is; the HLS master is fetched and parsed.
/// HLS failures are logged and yield no HLS formats.
pub async fn extract_formats_and_subtitles(
    fetcher: &dyn MediaFetcher,
    manifest_url: &str,
) -> HlsExtraction {
    let manifest_url = strip_unsigned_params(manifest_url);

    let mut hds = MediaFormat::new("hds", f4m_url(&manifest_url), FormatProtocol::F4m);
    hds.ext = Some("flv".to_string());
    hds.extra_param_to_segment_url = Some(HDCORE_SIGN.to_string());

    let hls_url = m3u8_url(&manifest_url);
    let mut extraction = match hls::extract_formats_and_subtitles(fetcher, &hls_url, "hls").await
    {
        Ok(extraction) => extraction,
        Err(e) => {
            warn!("Akamai HLS manifest unavailable ({hls_url}): {e}");
            HlsExtraction::default()
        }
    };
    extraction.formats.insert(0, hds);
    extraction
}
