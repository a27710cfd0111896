//! Extraction error types.
//!
//! Errors fall into three groups:
//! - fatal extraction failures (no chapters, malformed responses, network)
//! - expected, user-facing availability errors ([`ExtractError::Blocked`])
//! - geo-restriction ([`ExtractError::GeoRestricted`]), which callers may
//!   retry with a Swiss `X-Forwarded-For` address

use thiserror::Error;

/// Errors produced while resolving a media URL.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("No chapters found")]
    NoChapters,

    #[error("{provider} said: {message}")]
    Blocked {
        provider: &'static str,
        reason: String,
        message: String,
    },

    #[error("{message} (available in: {})", .countries.join(", "))]
    GeoRestricted {
        message: String,
        countries: Vec<String>,
    },

    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),

    #[error("Invalid media reference: {0}")]
    InvalidMediaRef(String),

    #[error("HTTP error {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ExtractError {
    /// Whether this error describes content availability rather than a bug
    /// or an infrastructure failure.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::Blocked { .. } | Self::GeoRestricted { .. })
    }

    /// Whether a Swiss `X-Forwarded-For` address might get past this error.
    pub fn is_geo_restricted(&self) -> bool {
        matches!(self, Self::GeoRestricted { .. })
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
