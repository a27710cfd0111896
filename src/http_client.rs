//! HTTP access for providers.
//!
//! Providers never talk to `reqwest` directly; they go through the
//! [`MediaFetcher`] trait so extraction logic can run against canned
//! responses in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ExtractorConfig;
use crate::error::{ExtractError, Result};

/// Fetches text documents (JSON, playlists) over HTTP.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// GET `url` with extra query pairs appended and return the body.
    async fn fetch_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String>;
}

/// GET `url` and deserialize the body as JSON.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn MediaFetcher,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T> {
    let body = fetcher.fetch_text(url, query).await?;
    Ok(serde_json::from_str(&body)?)
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(ip) = config.forwarded_for() {
            debug!("Using X-Forwarded-For: {ip}");
            let value = HeaderValue::from_str(&ip)
                .map_err(|e| ExtractError::Config(format!("invalid x_forwarded_for: {e}")))?;
            headers.insert("X-Forwarded-For", value);
        }

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .http2_adaptive_window(true)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .zstd(true)
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    #[instrument(skip(self, query))]
    async fn fetch_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let mut req = self.client.get(url);
        if !query.is_empty() {
            req = req.query(query);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ExtractError::Http {
                status: status.as_u16(),
                url: resp.url().to_string(),
            });
        }

        let body = resp.text().await?;
        debug!("Fetched {} bytes", body.len());
        Ok(body)
    }
}
