//! HLS playlist parsing.
//!
//! Only what a format listing needs: master playlist variants, media
//! playlists as a single rendition, and `#EXT-X-MEDIA` subtitle groups.
//! Segment handling is left to the downloader.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::provider::{FormatProtocol, MediaFormat, SubtitleMap, SubtitleTrack};
use crate::error::Result;
use crate::http_client::MediaFetcher;

static QUOTED_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Z-]+)="([^"]*)""#).expect("invalid attribute regex"));

/// Formats and subtitles found in one playlist.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HlsExtraction {
    pub formats: Vec<MediaFormat>,
    pub subtitles: SubtitleMap,
}

/// Fetch `url` and parse it with [`parse_playlist`].
pub async fn extract_formats_and_subtitles(
    fetcher: &dyn MediaFetcher,
    url: &str,
    m3u8_id: &str,
) -> Result<HlsExtraction> {
    let content = fetcher.fetch_text(url, &[]).await?;
    Ok(parse_playlist(&content, url, m3u8_id))
}

/// Parse a master or media playlist located at `playlist_url`.
pub fn parse_playlist(content: &str, playlist_url: &str, m3u8_id: &str) -> HlsExtraction {
    let mut extraction = HlsExtraction::default();

    if !content.contains("#EXT-X-STREAM-INF:") {
        // Media playlist: the URL itself is the only rendition.
        if content.contains("#EXTINF:") {
            let mut format =
                MediaFormat::new(m3u8_id, playlist_url, FormatProtocol::M3u8Native);
            format.ext = Some("mp4".to_string());
            extraction.formats.push(format);
        }
        return extraction;
    }

    let mut lines = content.lines().map(str::trim);
    while let Some(line) = lines.next() {
        if let Some(rest) = line.strip_prefix("#EXT-X-MEDIA:") {
            let attrs = parse_attributes(rest);
            if attrs.get("TYPE").map(String::as_str) != Some("SUBTITLES") {
                continue;
            }
            let Some(uri) = attrs.get("URI") else {
                continue;
            };
            let lang = attrs
                .get("LANGUAGE")
                .cloned()
                .unwrap_or_else(|| "und".to_string());
            let mut track = SubtitleTrack::new(resolve_url(playlist_url, uri));
            track.name = attrs.get("NAME").cloned();
            track.ext = Some("vtt".to_string());
            extraction.subtitles.entry(lang).or_default().push(track);
        } else if let Some(rest) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            let attrs = parse_attributes(rest);

            // The variant URI is the next non-comment line.
            let Some(uri) = lines.find(|l| !l.is_empty() && !l.starts_with('#')) else {
                break;
            };

            let tbr = attrs
                .get("AVERAGE-BANDWIDTH")
                .or_else(|| attrs.get("BANDWIDTH"))
                .and_then(|b| b.parse::<f64>().ok())
                .map(|b| b / 1000.0);
            let (width, height) = attrs
                .get("RESOLUTION")
                .and_then(|r| r.split_once('x'))
                .map_or((None, None), |(w, h)| (w.parse().ok(), h.parse().ok()));

            let suffix = tbr.map_or_else(
                || extraction.formats.len().to_string(),
                |t| format!("{t:.0}"),
            );
            let mut format = MediaFormat::new(
                format!("{m3u8_id}-{suffix}"),
                resolve_url(playlist_url, uri),
                FormatProtocol::M3u8Native,
            );
            format.ext = Some("mp4".to_string());
            format.tbr = tbr;
            format.width = width;
            format.height = height;
            format.codecs = attrs.get("CODECS").cloned();
            extraction.formats.push(format);
        }
    }

    debug!(
        "Parsed {} variants, {} subtitle languages from {playlist_url}",
        extraction.formats.len(),
        extraction.subtitles.len()
    );
    extraction
}

/// Scan raw playlist text for `#EXT-X-MEDIA:TYPE=SUBTITLES` lines.
///
/// Entries need both `URI` and `LANGUAGE`; `NAME` is optional.
pub fn scan_subtitle_media(content: &str, playlist_url: &str) -> SubtitleMap {
    let mut subtitles = SubtitleMap::new();

    for line in content.lines() {
        let Some(entry) = line.trim().strip_prefix("#EXT-X-MEDIA:TYPE=SUBTITLES,") else {
            continue;
        };

        let attrs: HashMap<&str, &str> = QUOTED_ATTR_RE
            .captures_iter(entry)
            .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
            .collect();

        let (Some(uri), Some(lang)) = (attrs.get("URI"), attrs.get("LANGUAGE")) else {
            continue;
        };

        let url = if uri.starts_with("http") {
            (*uri).to_string()
        } else {
            resolve_url(playlist_url, uri)
        };
        let mut track = SubtitleTrack::new(url);
        track.name = Some(attrs.get("NAME").copied().unwrap_or_default().to_string());
        subtitles.entry((*lang).to_string()).or_default().push(track);
    }

    subtitles
}

/// Parse an HLS attribute list (`KEY=VALUE,KEY="quoted, value"`).
pub fn parse_attributes(attr_str: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut chars = attr_str.chars().peekable();

    while chars.peek().is_some() {
        let key: String = chars.by_ref().take_while(|&c| c != '=').collect();

        if key.trim().is_empty() {
            break;
        }

        let value = if chars.peek() == Some(&'"') {
            chars.next(); // opening quote
            let v: String = chars.by_ref().take_while(|&c| c != '"').collect();
            chars.next(); // trailing comma
            v
        } else {
            chars.by_ref().take_while(|&c| c != ',').collect()
        };

        attrs.insert(key.trim().to_string(), value.trim().to_string());
    }

    attrs
}

/// Resolve a playlist-relative URI against the playlist URL.
pub fn resolve_url(base: &str, relative: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(relative))
        .map_or_else(|_| relative.to_string(), String::from)
}
