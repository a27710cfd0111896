//! Streaming service providers

pub mod srgssr;
pub mod srgssr_play;

pub use srgssr::{BusinessUnit, MediaRef, MediaType, SrgSsrProvider};
pub use srgssr_play::SrgSsrPlayProvider;

/// Media reference for a canonical id, player URL or play-site URL,
/// without touching the network.
pub fn resolve_media_ref(url: &str) -> Option<MediaRef> {
    SrgSsrPlayProvider::media_ref(url).or_else(|| url.parse().ok())
}
