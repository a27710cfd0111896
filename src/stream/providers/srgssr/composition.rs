//! Integration layer "media composition" documents.

use serde::de::Deserializer;
use serde::Deserialize;
use serde_json::Value;

use super::media_ref::MediaRef;

/// Why the integration layer refuses to play a chapter.
///
/// Codes outside this set (including `ENDDATE`) are not treated as blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    AgeRating12,
    AgeRating18,
    GeoBlock,
    Legal,
    StartDate,
}

impl BlockReason {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "AGERATING12" => Some(Self::AgeRating12),
            "AGERATING18" => Some(Self::AgeRating18),
            "GEOBLOCK" => Some(Self::GeoBlock),
            "LEGAL" => Some(Self::Legal),
            "STARTDATE" => Some(Self::StartDate),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::AgeRating12 => "AGERATING12",
            Self::AgeRating18 => "AGERATING18",
            Self::GeoBlock => "GEOBLOCK",
            Self::Legal => "LEGAL",
            Self::StartDate => "STARTDATE",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::AgeRating12 => "To protect children under the age of 12, this video is only available between 8 p.m. and 6 a.m.",
            Self::AgeRating18 => "To protect children under the age of 18, this video is only available between 11 p.m. and 5 a.m.",
            Self::GeoBlock => "For legal reasons, this video is only available in Switzerland.",
            Self::Legal => "The video cannot be transmitted for legal reasons.",
            Self::StartDate => "This video is not yet available. Please try again later.",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaComposition {
    /// Full episode first, then its segments; may be empty.
    #[serde(default, deserialize_with = "null_as_default")]
    pub chapter_list: Vec<Chapter>,
    /// Programme the media belongs to.
    #[serde(default, deserialize_with = "lenient")]
    pub show: Option<Show>,
    /// Season and episode numbering, when the programme has any.
    #[serde(default, deserialize_with = "lenient")]
    pub episode: Option<Episode>,
}

/// One playable chapter. Every field is optional and values of the wrong
/// JSON type read as `None`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    /// Media id, numeric or UUID.
    #[serde(default, deserialize_with = "string_or_none")]
    pub id: Option<String>,
    /// `urn:{bu}:video:{id}`.
    #[serde(default, deserialize_with = "text_or_none")]
    pub urn: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub description: Option<String>,
    /// Short teaser, used when `description` is empty.
    #[serde(default, deserialize_with = "text_or_none")]
    pub lead: Option<String>,
    /// ISO 8601 broadcast date.
    #[serde(default, deserialize_with = "text_or_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "text_or_none")]
    pub image_url: Option<String>,
    /// Broadcasting channel, e.g. `SRF`.
    #[serde(default, deserialize_with = "text_or_none")]
    pub vendor: Option<String>,
    /// Milliseconds.
    #[serde(default, deserialize_with = "float_or_none")]
    pub duration: Option<f64>,
    /// Raw block code; see [`BlockReason`].
    #[serde(default, deserialize_with = "text_or_none")]
    pub block_reason: Option<String>,
    /// Set on segments: URN of the full-length chapter they cut from.
    #[serde(default, deserialize_with = "text_or_none")]
    pub full_length_urn: Option<String>,
    /// Segment start within the full-length chapter, milliseconds.
    #[serde(default, deserialize_with = "int_or_none")]
    pub mark_in: Option<i64>,
    /// Segment end within the full-length chapter, milliseconds.
    #[serde(default, deserialize_with = "int_or_none")]
    pub mark_out: Option<i64>,
    /// 0 for the primary chapter.
    #[serde(default, deserialize_with = "int_or_none")]
    pub position: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resource_list: Vec<Resource>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subtitle_list: Vec<Subtitle>,
    /// Downloadable audio, SD tier.
    #[serde(default, deserialize_with = "text_or_none")]
    pub podcast_sd_url: Option<String>,
    /// Downloadable audio, HD tier.
    #[serde(default, deserialize_with = "text_or_none")]
    pub podcast_hd_url: Option<String>,
}

impl Chapter {
    pub fn is_segment(&self) -> bool {
        non_empty(self.full_length_urn.as_deref()).is_some()
    }

    /// Segment bounds in seconds, when this is a segment with both marks.
    #[allow(clippy::cast_precision_loss)]
    pub fn segment_range(&self) -> Option<(f64, f64)> {
        if !self.is_segment() {
            return None;
        }
        let (mark_in, mark_out) = self.mark_in.zip(self.mark_out)?;
        Some((mark_in as f64 / 1000.0, mark_out as f64 / 1000.0))
    }

    pub fn block_reason(&self) -> Option<BlockReason> {
        self.block_reason.as_deref().and_then(BlockReason::from_code)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default, deserialize_with = "text_or_none")]
    pub url: Option<String>,
    /// `HTTP`, `HTTPS`, `HLS`, `HDS`, ...
    #[serde(default, deserialize_with = "text_or_none")]
    pub protocol: Option<String>,
    /// `SD`, `HD`, ...
    #[serde(default, deserialize_with = "text_or_none")]
    pub quality: Option<String>,
    /// Codec family, e.g. `H264`.
    #[serde(default, deserialize_with = "text_or_none")]
    pub encoding: Option<String>,
    /// `AKAMAI` when a token must be appended.
    #[serde(default, deserialize_with = "text_or_none")]
    pub token_type: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtitle {
    #[serde(default, deserialize_with = "text_or_none")]
    pub url: Option<String>,
    /// Language code; empty means the business unit's language.
    #[serde(default, deserialize_with = "text_or_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Show {
    /// Series title.
    #[serde(default, deserialize_with = "text_or_none")]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    #[serde(default, deserialize_with = "int_or_none")]
    pub season_number: Option<i64>,
    /// Episode number within the season.
    #[serde(default, deserialize_with = "int_or_none")]
    pub number: Option<i64>,
}

/// The chapter to play plus the full-length chapter segments fall back to.
#[derive(Debug, Clone, Copy)]
pub struct SelectedChapter<'a> {
    pub chapter: &'a Chapter,
    pub parent: &'a Chapter,
}

impl MediaComposition {
    /// Pick the chapter for `media`.
    ///
    /// Matches on chapter id or `urn:{bu}:video:{id}`. With no match the
    /// first chapter is used, even though it may be unrelated content.
    /// Returns `None` only for an empty chapter list.
    pub fn select_chapter(&self, media: &MediaRef) -> Option<SelectedChapter<'_>> {
        let first = self.chapter_list.first()?;
        let urn = media.video_urn();

        let chapter = self
            .chapter_list
            .iter()
            .find(|ch| {
                ch.id.as_deref() == Some(media.id.as_str()) || ch.urn.as_deref() == Some(urn.as_str())
            })
            .unwrap_or(first);

        let parent = self
            .chapter_list
            .iter()
            .find(|ch| !ch.is_segment())
            .unwrap_or(first);

        Some(SelectedChapter { chapter, parent })
    }

    pub fn show_title(&self) -> Option<&str> {
        non_empty(self.show.as_ref()?.title.as_deref())
    }
}

/// `Some` only for non-empty strings.
pub(crate) fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Integers may arrive as numbers, floats or numeric strings.
#[allow(clippy::cast_possible_truncation)]
fn int_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn float_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// String values only; anything else reads as `None`.
fn text_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// `None` for a value that doesn't fit `T` instead of failing the document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| serde_json::from_value(v).ok()))
}
