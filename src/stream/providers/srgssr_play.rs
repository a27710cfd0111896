//! srf.ch, rts.ch, rsi.ch, rtr.ch and swissinfo.ch play sites.
//!
//! Pages are never fetched: the business unit, media type and id are read
//! off the URL and handed to [`SrgSsrProvider`](super::SrgSsrProvider) as a
//! canonical `srgssr:` id.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::srgssr::{MediaRef, SrgSsrProvider};
use crate::error::{ExtractError, Result};
use crate::stream::provider::{Extraction, StreamProvider};

static PLAY_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^https?://
            (?:(?:www|play)\.)?
            (?P<bu>srf|rts|rsi|rtr|swissinfo)\.ch/play/(?:tv|radio)/
            (?:
                [^/]+/(?P<type>video|audio)/[^?]+|
                popup(?P<type_2>video|audio)player
            )
            \?.*?\b(?:id=|urn=urn:[^:]+:video:)(?P<id>[0-9a-f\-]{36}|\d+)
        ",
    )
    .expect("invalid play url regex")
});

pub struct SrgSsrPlayProvider;

impl SrgSsrPlayProvider {
    pub const NAME: &'static str = "srgssr:play";

    /// Business unit, media type and id encoded in a play-site URL.
    pub fn media_ref(url: &str) -> Option<MediaRef> {
        let caps = PLAY_URL_RE.captures(url)?;
        let media_type = caps.name("type").or_else(|| caps.name("type_2"))?;
        Some(MediaRef {
            bu: caps["bu"].parse().ok()?,
            media_type: media_type.as_str().parse().ok()?,
            id: caps["id"].to_string(),
        })
    }
}

#[async_trait]
impl StreamProvider for SrgSsrPlayProvider {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn matches(&self, url: &str) -> bool {
        PLAY_URL_RE.is_match(url)
    }

    async fn extract(&self, url: &str) -> Result<Extraction> {
        let media =
            Self::media_ref(url).ok_or_else(|| ExtractError::UnsupportedUrl(url.to_string()))?;
        tracing::debug!("Play URL {url} -> {media}");
        Ok(Extraction::Redirect {
            url: media.canonical(),
            provider: Some(SrgSsrProvider::NAME),
        })
    }
}
