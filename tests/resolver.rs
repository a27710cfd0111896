//! End-to-end resolution against canned integration layer responses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use srgplay::stream::providers::SrgSsrProvider;
use srgplay::stream::FormatProtocol;
use srgplay::{
    BusinessUnit, ExtractError, ExtractorConfig, MediaFetcher, MediaInfo, MediaRef, MediaType,
    ProviderRouter, Result,
};

const API: &str = "https://il.test/integrationlayer/2.0";
const TOKEN_URL: &str = "https://tp.test/akahd/token?acl=*";

/// Serves canned bodies keyed by URL plus query, and records every request.
#[derive(Default)]
struct FakeFetcher {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn with(mut self, url: &str, body: impl Into<String>) -> Self {
        self.responses.insert(url.to_string(), body.into());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let key = if query.is_empty() {
            url.to_string()
        } else {
            let query: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            format!("{url}?{}", query.join("&"))
        };
        self.requests.lock().unwrap().push(key.clone());
        self.responses
            .get(&key)
            .cloned()
            .ok_or(ExtractError::Http {
                status: 404,
                url: key,
            })
    }
}

fn config() -> ExtractorConfig {
    ExtractorConfig {
        api_base: API.to_string(),
        token_url: TOKEN_URL.to_string(),
        ..ExtractorConfig::default()
    }
}

fn video_composition_url(bu: &str, id: &str) -> String {
    format!("{API}/{bu}/mediaComposition/video/{id}.json?onlyChapters=true")
}

async fn resolve(fetcher: FakeFetcher, media: &MediaRef) -> (Result<MediaInfo>, Vec<String>) {
    let fetcher = Arc::new(fetcher);
    let provider = SrgSsrProvider::new(fetcher.clone(), &config());
    let result = provider.extract_media(media).await;
    (result, fetcher.requests())
}

fn srf_video(id: &str) -> MediaRef {
    MediaRef::new(BusinessUnit::Srf, MediaType::Video, id)
}

const MASTER: &str = "#EXTM3U
#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",NAME=\"Deutsch\",LANGUAGE=\"de\",URI=\"subs/de.m3u8\"
#EXT-X-STREAM-INF:BANDWIDTH=544000,RESOLUTION=640x360,CODECS=\"avc1.4d401e,mp4a.40.2\",SUBTITLES=\"subs\"
index_0_av.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1928000,RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\",SUBTITLES=\"subs\"
index_1_av.m3u8
";

#[tokio::test]
async fn assembles_metadata_and_ranks_http_qualities() {
    let composition = json!({
        "show": {"title": "10vor10"},
        "episode": {"seasonNumber": 2, "number": "14"},
        "chapterList": [{
            "id": "28e1a57d",
            "urn": "urn:srf:video:28e1a57d",
            "title": "Snowden beantragt Asyl in Russland",
            "description": "",
            "lead": "Der Whistleblower sitzt in Moskau fest.",
            "date": "2013-07-01T21:50:15+02:00",
            "imageUrl": "https://img.test/snowden.jpg",
            "vendor": "SRF",
            "duration": 113_827,
            "resourceList": [
                {"url": "https://cdn.test/hd.mp4", "protocol": "HTTP", "quality": "HD", "encoding": "H264"},
                {"url": "https://cdn.test/sd.mp4", "protocol": "HTTPS", "quality": "SD", "encoding": "H264"},
                {"url": "rtmp://cdn.test/live", "protocol": "RTMP", "quality": "HD"},
                {"url": "", "protocol": "HTTP", "quality": "SD"}
            ]
        }]
    });
    let fetcher = FakeFetcher::default().with(
        &video_composition_url("srf", "28e1a57d"),
        composition.to_string(),
    );

    let (result, _) = resolve(fetcher, &srf_video("28e1a57d")).await;
    let info = result.unwrap();

    assert_eq!(info.id, "28e1a57d");
    assert_eq!(info.title.as_deref(), Some("Snowden beantragt Asyl in Russland"));
    assert_eq!(
        info.description.as_deref(),
        Some("Der Whistleblower sitzt in Moskau fest.")
    );
    assert_eq!(info.timestamp, Some(1_372_708_215));
    assert_eq!(info.thumbnail.as_deref(), Some("https://img.test/snowden.jpg"));
    assert_eq!(info.duration, Some(113.827));
    assert_eq!(info.series.as_deref(), Some("10vor10"));
    assert_eq!(info.season_number, Some(2));
    assert_eq!(info.episode_number, Some(14));
    assert_eq!(info.channel.as_deref(), Some("SRF"));

    let ids: Vec<&str> = info.formats.iter().map(|f| f.format_id.as_str()).collect();
    assert_eq!(ids, ["HTTP-H264-HD", "HTTPS-H264-SD"]);
    let hd = &info.formats[0];
    let sd = &info.formats[1];
    assert_eq!(hd.protocol, FormatProtocol::Http);
    assert!(hd.quality > sd.quality);
}

#[tokio::test]
async fn series_falls_back_to_chapter_title() {
    let composition = json!({
        "chapterList": [{"id": "1", "title": "Tagesschau", "resourceList": null}]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "1"), composition.to_string());

    let info = resolve(fetcher, &srf_video("1")).await.0.unwrap();
    assert_eq!(info.series.as_deref(), Some("Tagesschau"));
    assert_eq!(info.season_number, None);
    assert!(info.formats.is_empty());
}

#[tokio::test]
async fn selects_chapter_by_urn() {
    let composition = json!({
        "chapterList": [
            {"id": "other", "urn": "urn:rts:video:1", "title": "First"},
            {"urn": "urn:rts:video:6348260", "title": "Le 19h30"}
        ]
    });
    let fetcher = FakeFetcher::default().with(
        &video_composition_url("rts", "6348260"),
        composition.to_string(),
    );
    let media = MediaRef::new(BusinessUnit::Rts, MediaType::Video, "6348260");

    let info = resolve(fetcher, &media).await.0.unwrap();
    assert_eq!(info.title.as_deref(), Some("Le 19h30"));
}

#[tokio::test]
async fn unmatched_id_falls_back_to_first_chapter() {
    let composition = json!({
        "chapterList": [
            {"id": "a", "title": "Unrelated"},
            {"id": "b", "title": "Also unrelated"}
        ]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "zzz"), composition.to_string());

    let info = resolve(fetcher, &srf_video("zzz")).await.0.unwrap();
    assert_eq!(info.title.as_deref(), Some("Unrelated"));
    assert_eq!(info.id, "zzz");
}

#[tokio::test]
async fn empty_or_missing_chapter_list_fails() {
    for body in [json!({"chapterList": []}), json!({"chapterList": null}), json!({})] {
        let fetcher =
            FakeFetcher::default().with(&video_composition_url("srf", "x"), body.to_string());
        let err = resolve(fetcher, &srf_video("x")).await.0.unwrap_err();
        assert!(matches!(err, ExtractError::NoChapters), "{body}: {err:?}");
    }
}

#[tokio::test]
async fn missing_composition_is_an_http_error() {
    let (result, requests) = resolve(FakeFetcher::default(), &srf_video("gone")).await;
    assert!(matches!(
        result.unwrap_err(),
        ExtractError::Http { status: 404, .. }
    ));
    assert_eq!(requests, [video_composition_url("srf", "gone")]);
}

#[tokio::test]
async fn block_reasons_stop_before_any_media_request() {
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "blockReason": "AGERATING18",
            "resourceList": [{"url": "https://cdn.test/x.m3u8", "protocol": "HLS"}]
        }]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "x"), composition.to_string());

    let (result, requests) = resolve(fetcher, &srf_video("x")).await;
    let err = result.unwrap_err();
    assert!(err.is_expected());
    assert_eq!(
        err.to_string(),
        "srgssr said: To protect children under the age of 18, this video is only available between 11 p.m. and 5 a.m."
    );
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn geoblock_is_geo_restricted() {
    let composition = json!({"chapterList": [{"id": "x", "blockReason": "GEOBLOCK"}]});
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "x"), composition.to_string());

    let err = resolve(fetcher, &srf_video("x")).await.0.unwrap_err();
    assert!(err.is_geo_restricted());
    match err {
        ExtractError::GeoRestricted { countries, .. } => assert_eq!(countries, ["CH"]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn segment_inherits_parent_hls_with_time_range() {
    let composition = json!({
        "chapterList": [
            {
                "id": "full",
                "urn": "urn:srf:video:full",
                "title": "Full episode",
                "resourceList": [{
                    "url": "https://hls.test/full/master.m3u8?caption=1",
                    "protocol": "HLS",
                    "quality": "HD"
                }]
            },
            {
                "id": "seg",
                "urn": "urn:srf:video:seg",
                "title": "Segment",
                "fullLengthUrn": "urn:srf:video:full",
                "markIn": 12_345,
                "markOut": 67_500,
                "resourceList": []
            }
        ]
    });
    let playlist_url = "https://hls.test/full/master.m3u8?caption=1&start=12.345&end=67.500";
    let fetcher = FakeFetcher::default()
        .with(&video_composition_url("srf", "seg"), composition.to_string())
        .with(playlist_url, MASTER);

    let (result, requests) = resolve(fetcher, &srf_video("seg")).await;
    let info = result.unwrap();

    assert_eq!(info.title.as_deref(), Some("Segment"));
    let ids: Vec<&str> = info.formats.iter().map(|f| f.format_id.as_str()).collect();
    assert_eq!(ids, ["HLS-HD-544", "HLS-HD-1928"]);
    assert_eq!(info.formats[1].url, "https://hls.test/full/index_1_av.m3u8");
    assert_eq!(info.formats[1].height, Some(720));

    // Parsed and rescanned, deduplicated by URL.
    assert_eq!(info.subtitles.len(), 1);
    assert_eq!(info.subtitles["de"].len(), 1);
    assert_eq!(info.subtitles["de"][0].url, "https://hls.test/full/subs/de.m3u8");

    assert_eq!(
        requests.iter().filter(|r| r.as_str() == playlist_url).count(),
        2
    );
}

#[tokio::test]
async fn direct_scan_finds_subtitles_the_parser_skips() {
    let media_playlist = "#EXTM3U
#EXT-X-MEDIA:TYPE=SUBTITLES,GROUP-ID=\"subs\",NAME=\"Français\",LANGUAGE=\"fr\",URI=\"https://subs.test/fr.m3u8\"
#EXTINF:10.0,
seg0.ts
";
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "resourceList": [{"url": "https://hls.test/x/index.m3u8", "protocol": "HLS"}]
        }]
    });
    let fetcher = FakeFetcher::default()
        .with(&video_composition_url("rts", "x"), composition.to_string())
        .with("https://hls.test/x/index.m3u8", media_playlist);
    let media = MediaRef::new(BusinessUnit::Rts, MediaType::Video, "x");

    let info = resolve(fetcher, &media).await.0.unwrap();
    assert_eq!(info.formats.len(), 1);
    assert_eq!(info.formats[0].format_id, "HLS");
    let fr = &info.subtitles["fr"];
    assert_eq!(fr[0].url, "https://subs.test/fr.m3u8");
    assert_eq!(fr[0].name.as_deref(), Some("Français"));
}

#[tokio::test]
async fn broken_playlist_still_resolves() {
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "resourceList": [
                {"url": "https://hls.test/missing.m3u8", "protocol": "HLS"},
                {"url": "https://cdn.test/x.mp4", "protocol": "HTTP", "quality": "SD"}
            ]
        }]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "x"), composition.to_string());

    let info = resolve(fetcher, &srf_video("x")).await.0.unwrap();
    assert_eq!(info.formats.len(), 1);
    assert_eq!(info.formats[0].format_id, "HTTP-SD");
}

#[tokio::test]
async fn akamai_resource_without_token_is_best_effort() {
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "resourceList": [{
                "url": "https://srgssrch.akamaihd.net/i/foo/master.m3u8?b=100-1000&__b__=200",
                "protocol": "HLS",
                "tokenType": "AKAMAI"
            }]
        }]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "x"), composition.to_string());

    let (result, requests) = resolve(fetcher, &srf_video("x")).await;
    let info = result.unwrap();

    assert!(requests.iter().any(|r| r == TOKEN_URL));
    assert_eq!(info.formats.len(), 1);
    let hds = &info.formats[0];
    assert_eq!(hds.format_id, "hds");
    assert_eq!(hds.protocol, FormatProtocol::F4m);
    assert_eq!(
        hds.url,
        "https://srgssrch.akamaihd.net/z/foo/manifest.f4m?hdcore=3.7.0"
    );
}

#[tokio::test]
async fn akamai_token_is_appended() {
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "resourceList": [{
                "url": "https://srgssrch.akamaihd.net/i/foo/master.m3u8",
                "protocol": "HLS",
                "quality": "HD",
                "tokenType": "AKAMAI"
            }]
        }]
    });
    let token = json!({"token": {"authparams": "hdnea=st=1~exp=2~hmac=ab"}});
    let signed = "https://srgssrch.akamaihd.net/i/foo/master.m3u8?hdnea=st=1~exp=2~hmac=ab";
    let fetcher = FakeFetcher::default()
        .with(&video_composition_url("srf", "x"), composition.to_string())
        .with(TOKEN_URL, token.to_string())
        .with(signed, MASTER);

    let info = resolve(fetcher, &srf_video("x")).await.0.unwrap();

    let ids: Vec<&str> = info.formats.iter().map(|f| f.format_id.as_str()).collect();
    assert_eq!(ids, ["hds", "hls-544", "hls-1928"]);
    assert_eq!(
        info.formats[0].url,
        "https://srgssrch.akamaihd.net/z/foo/manifest.f4m?hdnea=st=1~exp=2~hmac=ab&hdcore=3.7.0"
    );
    assert!(info.subtitles.contains_key("de"));
}

fn podcast_composition(position: i64) -> Value {
    json!({
        "chapterList": [{
            "id": "pod",
            "position": position,
            "podcastSdUrl": "https://pod.test/sd.mp3",
            "podcastHdUrl": "https://pod.test/hd.mp3",
            "subtitleList": [{"url": "https://subs.test/x.vtt", "locale": "rm"}],
            "resourceList": [{"url": "https://cdn.test/a.mp3", "protocol": "HTTP", "quality": "HQ"}]
        }]
    })
}

#[tokio::test]
async fn first_audio_chapter_gets_podcast_formats() {
    let url = format!("{API}/rtr/mediaComposition/audio/pod.json");
    let fetcher = FakeFetcher::default().with(&url, podcast_composition(0).to_string());
    let media = MediaRef::new(BusinessUnit::Rtr, MediaType::Audio, "pod");

    let (result, requests) = resolve(fetcher, &media).await;
    let info = result.unwrap();

    // Audio compositions are requested without onlyChapters.
    assert_eq!(requests[0], url);
    let ids: Vec<&str> = info.formats.iter().map(|f| f.format_id.as_str()).collect();
    assert_eq!(ids, ["HTTP-HQ", "PODCAST-SD", "PODCAST-HD"]);
    assert!(info.formats[0].quality < info.formats[1].quality);
    assert!(info.formats[1].quality < info.formats[2].quality);
    // Chapter subtitles are only read for video.
    assert!(info.subtitles.is_empty());
}

#[tokio::test]
async fn later_audio_chapters_skip_podcast_formats() {
    let url = format!("{API}/rtr/mediaComposition/audio/pod.json");
    let fetcher = FakeFetcher::default().with(&url, podcast_composition(3).to_string());
    let media = MediaRef::new(BusinessUnit::Rtr, MediaType::Audio, "pod");

    let info = resolve(fetcher, &media).await.0.unwrap();
    assert_eq!(info.formats.len(), 1);
    assert_eq!(info.formats[0].format_id, "HTTP-HQ");
}

#[tokio::test]
async fn chapter_subtitles_use_business_unit_locale() {
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "subtitleList": [
                {"url": "https://subs.test/a.vtt"},
                {"url": "https://subs.test/b.vtt", "locale": "de"}
            ]
        }]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("rsi", "x"), composition.to_string());
    let media = MediaRef::new(BusinessUnit::Rsi, MediaType::Video, "x");

    let info = resolve(fetcher, &media).await.0.unwrap();
    assert_eq!(info.subtitles["it"][0].url, "https://subs.test/a.vtt");
    assert_eq!(info.subtitles["de"][0].url, "https://subs.test/b.vtt");
}

#[tokio::test]
async fn router_resolves_play_urls_end_to_end() {
    let composition = json!({
        "chapterList": [{
            "id": "6348260",
            "title": "Le 19h30",
            "resourceList": [{"url": "https://cdn.test/19h30.mp4", "protocol": "HTTP", "quality": "HD"}]
        }]
    });
    let fetcher = Arc::new(
        FakeFetcher::default().with(&video_composition_url("rts", "6348260"), composition.to_string()),
    );
    let router = ProviderRouter::new(fetcher.clone(), &config());

    for url in [
        "http://www.rts.ch/play/tv/-/video/le-19h30?id=6348260",
        "https://tp.srgssr.ch/p/rts/default?urn=urn:rts:video:6348260",
        "srgssr:rts:video:6348260",
    ] {
        let info = router.extract(url).await.unwrap();
        assert_eq!(info.id, "6348260");
        assert_eq!(info.title.as_deref(), Some("Le 19h30"));
        assert_eq!(info.formats[0].format_id, "HTTP-HD");
    }
    assert_eq!(fetcher.requests().len(), 3);
}

#[tokio::test]
async fn akamai_hds_resource_derives_hls_master() {
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "resourceList": [{
                "url": "https://srgssrch.akamaihd.net/z/foo/manifest.f4m",
                "protocol": "HDS",
                "quality": "HD",
                "tokenType": "AKAMAI"
            }]
        }]
    });
    let token = json!({"token": {"authparams": "hdnea=st=1~exp=2~hmac=ab"}});
    let hls_master = "https://srgssrch.akamaihd.net/i/foo/master.m3u8?hdnea=st=1~exp=2~hmac=ab";
    let fetcher = FakeFetcher::default()
        .with(&video_composition_url("srf", "x"), composition.to_string())
        .with(TOKEN_URL, token.to_string())
        .with(hls_master, MASTER);

    let (result, requests) = resolve(fetcher, &srf_video("x")).await;
    let info = result.unwrap();

    let ids: Vec<&str> = info.formats.iter().map(|f| f.format_id.as_str()).collect();
    assert_eq!(ids, ["hds", "hls-544", "hls-1928"]);
    let hds = &info.formats[0];
    assert_eq!(hds.protocol, FormatProtocol::F4m);
    assert_eq!(
        hds.url,
        "https://srgssrch.akamaihd.net/z/foo/manifest.f4m?hdnea=st=1~exp=2~hmac=ab&hdcore=3.7.0"
    );
    assert_eq!(hds.extra_param_to_segment_url.as_deref(), Some("hdcore=3.7.0"));
    assert_eq!(
        requests,
        [
            video_composition_url("srf", "x"),
            TOKEN_URL.to_string(),
            hls_master.to_string(),
        ]
    );
}

#[tokio::test]
async fn hds_resource_without_token_is_skipped() {
    let composition = json!({
        "chapterList": [{
            "id": "x",
            "resourceList": [{
                "url": "https://srgssrch.akamaihd.net/z/foo/manifest.f4m",
                "protocol": "HDS",
                "quality": "HD"
            }]
        }]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "x"), composition.to_string());

    let (result, requests) = resolve(fetcher, &srf_video("x")).await;
    assert!(result.unwrap().formats.is_empty());
    assert_eq!(requests, [video_composition_url("srf", "x")]);
}

#[tokio::test]
async fn mistyped_fields_do_not_fail_extraction() {
    let composition = json!({
        "episode": "n/a",
        "chapterList": [
            {
                "id": "x",
                "title": "Tagesschau",
                "blockReason": 3,
                "resourceList": [{"url": "https://cdn.test/x.mp4", "protocol": "HTTP", "quality": "SD"}]
            },
            {"id": "y", "title": {"de": "Segment"}, "fullLengthUrn": 12}
        ]
    });
    let fetcher =
        FakeFetcher::default().with(&video_composition_url("srf", "x"), composition.to_string());

    let info = resolve(fetcher, &srf_video("x")).await.0.unwrap();
    assert_eq!(info.title.as_deref(), Some("Tagesschau"));
    assert_eq!(info.episode_number, None);
    assert_eq!(info.formats[0].format_id, "HTTP-SD");
}
