//! Streaming media extraction for the SRG SSR play sites.
//!
//! URLs are dispatched by [`ProviderRouter`] to a [`StreamProvider`];
//! play-site pages redirect to the integration layer provider, which
//! produces the final [`MediaInfo`].

pub mod akamai;
pub mod hls;
pub mod provider;
pub mod providers;
pub mod router;

pub use provider::{
    Extraction, FormatProtocol, MediaFormat, MediaInfo, StreamProvider, SubtitleMap,
    SubtitleTrack,
};
pub use router::ProviderRouter;
