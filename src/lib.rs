//! `srgplay` - media extraction for the SRG SSR play sites
//!
//! Resolves srf.ch, rts.ch, rsi.ch, rtr.ch and swissinfo.ch play URLs (and
//! canonical `srgssr:{bu}:{type}:{id}` ids) into a normalized list of
//! formats, subtitles and metadata via the SRG SSR integration layer.
//!
//! # Example
//!
//! ```rust,no_run
//! use srgplay::{ExtractorConfig, ProviderRouter};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ExtractorConfig::load()?;
//!     let router = ProviderRouter::from_config(&config)?;
//!     let info = router
//!         .extract("https://www.rts.ch/play/tv/-/video/le-19h30?id=6348260")
//!         .await?;
//!     println!("{} formats", info.formats.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http_client;
pub mod stream;

pub use config::ExtractorConfig;
pub use error::{ExtractError, Result};
pub use http_client::{HttpFetcher, MediaFetcher};
pub use stream::providers::{resolve_media_ref, BusinessUnit, MediaRef, MediaType};
pub use stream::{MediaFormat, MediaInfo, ProviderRouter, StreamProvider, SubtitleTrack};

/// Version of srgplay
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
