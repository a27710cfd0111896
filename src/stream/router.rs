//! URL dispatch across stream providers.

use std::sync::Arc;

use tracing::debug;

use super::provider::{Extraction, MediaInfo, StreamProvider};
use super::providers::{SrgSsrPlayProvider, SrgSsrProvider};
use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};
use crate::http_client::{HttpFetcher, MediaFetcher};

/// Routes URLs to providers and follows their redirects.
///
/// Providers are checked in registration order. First match wins.
pub struct ProviderRouter {
    providers: Vec<Box<dyn StreamProvider>>,
    max_redirects: usize,
}

impl ProviderRouter {
    /// Router with all providers, talking HTTP through `reqwest`.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self> {
        let fetcher: Arc<dyn MediaFetcher> = Arc::new(HttpFetcher::new(config)?);
        Ok(Self::new(fetcher, config))
    }

    /// Router with all providers sharing `fetcher`.
    pub fn new(fetcher: Arc<dyn MediaFetcher>, config: &ExtractorConfig) -> Self {
        let providers: Vec<Box<dyn StreamProvider>> = vec![
            Box::new(SrgSsrPlayProvider),
            Box::new(SrgSsrProvider::new(fetcher, config)),
        ];
        Self::with_providers(providers, config.max_redirects)
    }

    pub fn with_providers(providers: Vec<Box<dyn StreamProvider>>, max_redirects: usize) -> Self {
        Self {
            providers,
            max_redirects,
        }
    }

    /// First provider that accepts `url`, optionally restricted by name.
    pub fn find(&self, url: &str, name: Option<&str>) -> Option<&dyn StreamProvider> {
        for provider in &self.providers {
            if name.map_or(true, |n| provider.name() == n) && provider.matches(url) {
                return Some(provider.as_ref());
            }
        }
        None
    }

    /// Resolve `url` to media, following provider redirects.
    pub async fn extract(&self, url: &str) -> Result<MediaInfo> {
        let mut url = url.to_string();
        let mut target: Option<&'static str> = None;

        for _ in 0..=self.max_redirects {
            let provider = self
                .find(&url, target)
                .ok_or_else(|| ExtractError::UnsupportedUrl(url.clone()))?;
            debug!("Matched stream provider: {}", provider.name());

            match provider.extract(&url).await? {
                Extraction::Media(info) => return Ok(*info),
                Extraction::Redirect {
                    url: next,
                    provider,
                } => {
                    debug!("Redirect {url} -> {next}");
                    url = next;
                    target = provider;
                }
            }
        }

        Err(ExtractError::TooManyRedirects(self.max_redirects))
    }
}
