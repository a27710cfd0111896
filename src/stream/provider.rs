//! Stream provider trait and the normalized extraction result.
//!
//! A [`StreamProvider`] either resolves a URL into a [`MediaInfo`] or
//! redirects it to another provider (for example a play-site page that
//! maps onto a canonical media id).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// How a format's URL is meant to be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatProtocol {
    /// Progressive HTTP(S) download.
    Http,
    /// HLS media or master playlist.
    M3u8Native,
    /// Adobe HDS manifest.
    F4m,
}

/// A single downloadable rendition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaFormat {
    /// Unique within one result, e.g. `HTTP-H264-HD` or `hls-1928`.
    pub format_id: String,
    /// Media or manifest URL.
    pub url: String,
    /// How `url` is downloaded.
    pub protocol: FormatProtocol,
    /// Container file extension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    /// Relative preference; higher is better. `None` when unranked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<i32>,
    /// Total bitrate in kbit/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tbr: Option<f64>,
    /// Video width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Video height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// RFC 6381 codec list from the playlist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codecs: Option<String>,
    /// Query string the downloader must add to every segment request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_param_to_segment_url: Option<String>,
}

impl MediaFormat {
    pub fn new(format_id: impl Into<String>, url: impl Into<String>, protocol: FormatProtocol) -> Self {
        Self {
            format_id: format_id.into(),
            url: url.into(),
            protocol,
            ext: None,
            quality: None,
            tbr: None,
            width: None,
            height: None,
            codecs: None,
            extra_param_to_segment_url: None,
        }
    }
}

/// A subtitle file for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleTrack {
    /// Subtitle file or subtitle playlist URL.
    pub url: String,
    /// Display name from the playlist, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// File extension, e.g. `vtt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

impl SubtitleTrack {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            ext: None,
        }
    }
}

/// Language code → subtitle tracks.
pub type SubtitleMap = BTreeMap<String, Vec<SubtitleTrack>>;

/// Merge `other` into `into`, skipping tracks whose URL is already present
/// for the same language.
pub fn merge_subtitles(into: &mut SubtitleMap, other: SubtitleMap) {
    for (lang, tracks) in other {
        let existing = into.entry(lang).or_default();
        for track in tracks {
            if !existing.iter().any(|t| t.url == track.url) {
                existing.push(track);
            }
        }
    }
}

/// Normalized description of one media item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MediaInfo {
    /// Media id as requested, numeric or UUID.
    pub id: String,
    /// Chapter title.
    pub title: Option<String>,
    /// Description, or the teaser lead when the description is empty.
    pub description: Option<String>,
    /// Unix timestamp (seconds).
    pub timestamp: Option<i64>,
    /// URL of a representative image.
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Show title, falling back to the chapter title.
    pub series: Option<String>,
    /// Season number.
    pub season_number: Option<i64>,
    /// Episode number within its season.
    pub episode_number: Option<i64>,
    /// Broadcasting channel.
    pub channel: Option<String>,
    /// Available renditions, in the order they were found.
    pub formats: Vec<MediaFormat>,
    /// Subtitle tracks by language code.
    pub subtitles: SubtitleMap,
}

/// Outcome of running a provider on a URL.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Fully resolved media.
    Media(Box<MediaInfo>),
    /// Re-dispatch `url`, optionally to the named provider only.
    Redirect {
        url: String,
        provider: Option<&'static str>,
    },
}

/// Trait for streaming service providers.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Short lowercase provider name (e.g., `"srgssr"`).
    fn name(&self) -> &'static str;

    /// Returns `true` if this provider can handle the given URL.
    fn matches(&self, url: &str) -> bool;

    /// Resolve `url` into media or a redirect.
    async fn extract(&self, url: &str) -> Result<Extraction>;
}
