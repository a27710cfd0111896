//! SRG SSR integration layer provider.
//!
//! Resolves `srgssr:{bu}:{type}:{id}` (and `tp.srgssr.ch` player URLs)
//! into formats and subtitles using the media composition API.
//!
//! Requests made for one extraction, in order:
//! 1. the media composition document
//! 2. one Akamai token per protected resource (best-effort)
//! 3. per HLS resource, the playlist and a direct subtitle rescan of it

pub mod composition;
pub mod media_ref;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::http_client::{fetch_json, MediaFetcher};
use crate::stream::provider::{
    merge_subtitles, Extraction, FormatProtocol, MediaFormat, MediaInfo, StreamProvider,
    SubtitleMap, SubtitleTrack,
};
use crate::stream::{akamai, hls};

use composition::{non_empty, BlockReason, Chapter, MediaComposition, Resource};
pub use media_ref::{BusinessUnit, MediaRef, MediaType};

/// Countries a `GEOBLOCK` chapter is available in.
pub const GEO_COUNTRIES: &[&str] = &["CH"];

/// Quality tiers from worst to best.
const QUALITIES: &[&str] = &["SD", "HD"];

pub struct SrgSsrProvider {
    fetcher: Arc<dyn MediaFetcher>,
    api_base: String,
    token_url: String,
}

impl SrgSsrProvider {
    pub const NAME: &'static str = "srgssr";

    pub fn new(fetcher: Arc<dyn MediaFetcher>, config: &ExtractorConfig) -> Self {
        Self {
            fetcher,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token_url: config.token_url.clone(),
        }
    }

    fn composition_url(&self, media: &MediaRef) -> String {
        format!(
            "{}/{}/mediaComposition/{}/{}.json",
            self.api_base, media.bu, media.media_type, media.id
        )
    }

    async fn fetch_composition(&self, media: &MediaRef) -> Result<MediaComposition> {
        let url = self.composition_url(media);
        let query: &[(&str, &str)] = match media.media_type {
            MediaType::Video => &[("onlyChapters", "true")],
            MediaType::Audio => &[],
        };
        debug!("Downloading media composition for {media}");
        fetch_json(self.fetcher.as_ref(), &url, query).await
    }

    /// Append an Akamai auth token to `url`; unchanged if none is available.
    async fn tokenized_url(&self, url: &str, format_id: &str) -> String {
        debug!("Downloading {format_id} token");
        match fetch_json::<TokenResponse>(self.fetcher.as_ref(), &self.token_url, &[]).await {
            Ok(resp) => match resp.auth_params() {
                Some(params) => append_query(url, params),
                None => url.to_string(),
            },
            Err(e) => {
                warn!("Token request for {format_id} failed, continuing without: {e}");
                url.to_string()
            }
        }
    }

    /// Subtitle tracks declared in the playlist, or nothing if it can't be fetched.
    async fn scan_playlist_subtitles(&self, url: &str) -> SubtitleMap {
        match self.fetcher.fetch_text(url, &[]).await {
            Ok(content) => hls::scan_subtitle_media(&content, url),
            Err(e) => {
                debug!("Direct subtitle scan of {url} failed: {e}");
                SubtitleMap::new()
            }
        }
    }

    /// Resolve one media reference.
    pub async fn extract_media(&self, media: &MediaRef) -> Result<MediaInfo> {
        let composition = self.fetch_composition(media).await?;
        let selected = composition
            .select_chapter(media)
            .ok_or(ExtractError::NoChapters)?;
        let chapter = selected.chapter;

        check_block_reason(chapter)?;

        let resources = if chapter.resource_list.is_empty() && chapter.is_segment() {
            &selected.parent.resource_list
        } else {
            &chapter.resource_list
        };
        let segment_range = chapter.segment_range();

        let mut formats = Vec::new();
        let mut subtitles = SubtitleMap::new();

        for resource in resources {
            self.collect_resource(resource, segment_range, &mut formats, &mut subtitles)
                .await;
        }

        // Audio segments often carry the full episode's podcast URL, so it is
        // only trusted on the first chapter.
        if chapter.position == Some(0) {
            formats.extend(podcast_formats(chapter));
        }

        if media.media_type == MediaType::Video {
            merge_subtitles(&mut subtitles, chapter_subtitles(chapter, media.bu));
        }

        info!(
            "Resolved {media}: {} formats, {} subtitle languages",
            formats.len(),
            subtitles.len()
        );

        Ok(MediaInfo {
            id: media.id.clone(),
            title: chapter.title.clone(),
            description: non_empty(chapter.description.as_deref())
                .or(chapter.lead.as_deref())
                .map(str::to_string),
            timestamp: chapter.date.as_deref().and_then(parse_iso8601),
            thumbnail: chapter.image_url.clone(),
            duration: chapter.duration.map(|ms| ms / 1000.0),
            series: composition
                .show_title()
                .or(non_empty(chapter.title.as_deref()))
                .map(str::to_string),
            season_number: composition.episode.as_ref().and_then(|e| e.season_number),
            episode_number: composition.episode.as_ref().and_then(|e| e.number),
            channel: chapter.vendor.clone(),
            formats,
            subtitles,
        })
    }

    async fn collect_resource(
        &self,
        resource: &Resource,
        segment_range: Option<(f64, f64)>,
        formats: &mut Vec<MediaFormat>,
        subtitles: &mut SubtitleMap,
    ) {
        let Some(url) = non_empty(resource.url.as_deref()) else {
            return;
        };
        let protocol = resource.protocol.as_deref().unwrap_or_default();
        let format_id = join_nonempty(
            &[
                resource.protocol.as_deref(),
                resource.encoding.as_deref(),
                resource.quality.as_deref(),
            ],
            "-",
        );

        let mut url = url.to_string();
        if let Some((start, end)) = segment_range {
            if protocol == "HLS" {
                url = with_time_range(&url, start, end);
            }
        }

        match protocol {
            "HDS" | "HLS" if resource.token_type.as_deref() == Some("AKAMAI") => {
                let url = self.tokenized_url(&url, &format_id).await;
                let extraction =
                    akamai::extract_formats_and_subtitles(self.fetcher.as_ref(), &url).await;
                formats.extend(extraction.formats);
                merge_subtitles(subtitles, extraction.subtitles);
            }
            "HLS" => {
                match hls::extract_formats_and_subtitles(self.fetcher.as_ref(), &url, &format_id)
                    .await
                {
                    Ok(extraction) => {
                        formats.extend(extraction.formats);
                        merge_subtitles(subtitles, extraction.subtitles);
                    }
                    Err(e) => warn!("Skipping {format_id} playlist: {e}"),
                }
                // Picks up subtitle groups the playlist parser may have missed.
                let direct = self.scan_playlist_subtitles(&url).await;
                merge_subtitles(subtitles, direct);
            }
            "HTTP" | "HTTPS" => {
                let mut format = MediaFormat::new(format_id, url, FormatProtocol::Http);
                format.quality = Some(quality_rank(resource.quality.as_deref()));
                formats.push(format);
            }
            other => debug!("Ignoring {format_id} resource with protocol {other:?}"),
        }
    }
}

#[async_trait]
impl StreamProvider for SrgSsrProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn matches(&self, url: &str) -> bool {
        media_ref::MEDIA_REF_RE.is_match(url)
    }

    async fn extract(&self, url: &str) -> Result<Extraction> {
        let media: MediaRef = url.parse()?;
        let info = self.extract_media(&media).await?;
        Ok(Extraction::Media(Box::new(info)))
    }
}

/// Fail on block reasons the integration layer documents.
pub fn check_block_reason(chapter: &Chapter) -> Result<()> {
    let Some(reason) = chapter.block_reason() else {
        return Ok(());
    };
    let message = reason.message().to_string();
    if reason == BlockReason::GeoBlock {
        return Err(ExtractError::GeoRestricted {
            message,
            countries: GEO_COUNTRIES.iter().map(|c| (*c).to_string()).collect(),
        });
    }
    Err(ExtractError::Blocked {
        provider: SrgSsrProvider::NAME,
        reason: reason.code().to_string(),
        message,
    })
}

/// Set `start`/`end` (seconds, three decimals) on an HLS URL.
///
/// Existing values are replaced in place; other parameters keep their order.
/// A key repeated in the query keeps its first position and last value.
pub fn with_time_range(url: &str, start: f64, end: f64) -> String {
    let (base, query) = url.split_once('?').unwrap_or((url, ""));

    let mut params: Vec<(String, String)> = Vec::new();
    let pairs = query.split('&').filter(|p| !p.is_empty()).map(|p| {
        let (k, v) = p.split_once('=').unwrap_or((p, ""));
        (k.to_string(), v.to_string())
    });
    let time_range = [
        ("start".to_string(), format!("{start:.3}")),
        ("end".to_string(), format!("{end:.3}")),
    ];

    for (key, value) in pairs.chain(time_range) {
        match params.iter_mut().find(|(k, _)| *k == key) {
            Some(param) => param.1 = value,
            None => params.push((key, value)),
        }
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}

/// Rank of a quality tier in [`QUALITIES`]; unknown tiers rank lowest.
pub fn quality_rank(quality: Option<&str>) -> i32 {
    quality
        .and_then(|q| QUALITIES.iter().position(|known| *known == q))
        .and_then(|i| i32::try_from(i).ok())
        .unwrap_or(-1)
}

fn join_nonempty(parts: &[Option<&str>], sep: &str) -> String {
    parts
        .iter()
        .filter_map(|p| non_empty(*p))
        .collect::<Vec<_>>()
        .join(sep)
}

fn append_query(url: &str, params: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{params}")
}

fn podcast_formats(chapter: &Chapter) -> Vec<MediaFormat> {
    [
        ("SD", chapter.podcast_sd_url.as_deref()),
        ("HD", chapter.podcast_hd_url.as_deref()),
    ]
    .into_iter()
    .filter_map(|(quality, url)| {
        let url = non_empty(url)?;
        let mut format = MediaFormat::new(format!("PODCAST-{quality}"), url, FormatProtocol::Http);
        format.quality = Some(quality_rank(Some(quality)));
        Some(format)
    })
    .collect()
}

fn chapter_subtitles(chapter: &Chapter, bu: BusinessUnit) -> SubtitleMap {
    let mut subtitles = SubtitleMap::new();
    for sub in &chapter.subtitle_list {
        let Some(url) = non_empty(sub.url.as_deref()) else {
            continue;
        };
        let lang = non_empty(sub.locale.as_deref()).unwrap_or(bu.default_language());
        subtitles
            .entry(lang.to_string())
            .or_default()
            .push(SubtitleTrack::new(url));
    }
    subtitles
}

/// Unix timestamp from an ISO 8601 date; naive times are taken as UTC.
fn parse_iso8601(date: &str) -> Option<i64> {
    let date = date.trim();
    DateTime::parse_from_rfc3339(date)
        .or_else(|_| DateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|d| d.timestamp())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|d| d.and_utc().timestamp())
        })
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<Token>,
}

#[derive(Debug, Deserialize)]
struct Token {
    authparams: Option<String>,
}

impl TokenResponse {
    fn auth_params(&self) -> Option<&str> {
        non_empty(self.token.as_ref()?.authparams.as_deref())
    }
}
