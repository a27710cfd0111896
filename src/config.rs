//! Extractor configuration loaded from `~/.config/srgplay/config.toml`.
//!
//! Every key is optional; a missing file yields [`ExtractorConfig::default`].
//!
//! ```toml
//! api_base = "https://il.srgssr.ch/integrationlayer/2.0"
//! timeout_secs = 20
//! geo_bypass = true
//! ```

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::Deserialize;

use crate::error::{ExtractError, Result};

pub const DEFAULT_API_BASE: &str = "https://il.srgssr.ch/integrationlayer/2.0";
pub const DEFAULT_TOKEN_URL: &str = "http://tp.srgssr.ch/akahd/token?acl=*";

/// Runtime settings shared by the HTTP client and the providers.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Integration layer base URL (without trailing slash).
    pub api_base: String,
    /// Akamai token endpoint for protected HLS/HDS resources.
    pub token_url: String,
    pub user_agent: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Fixed `X-Forwarded-For` address sent with every request.
    pub x_forwarded_for: Option<String>,
    /// Send a random Swiss address when `x_forwarded_for` is unset.
    pub geo_bypass: bool,
    /// Maximum provider-to-provider redirects for one URL.
    pub max_redirects: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            user_agent: format!("srgplay/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            x_forwarded_for: None,
            geo_bypass: false,
            max_redirects: 5,
        }
    }
}

impl ExtractorConfig {
    /// Load from the default location, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load from `path`, falling back to defaults when the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::Config(format!("failed to read {}: {e}", path.display()))
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ExtractError::Config(msg) => {
                ExtractError::Config(format!("{msg} ({})", path.display()))
            }
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ExtractError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(ExtractError::Config(format!(
                "api_base must be an http(s) URL, got {:?}",
                self.api_base
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ExtractError::Config("timeout_secs must be > 0".to_string()));
        }
        Ok(())
    }

    /// The `X-Forwarded-For` value to send, if any.
    ///
    /// An explicit address wins over `geo_bypass`.
    pub fn forwarded_for(&self) -> Option<String> {
        self.x_forwarded_for
            .clone()
            .or_else(|| self.geo_bypass.then(random_swiss_ip))
    }
}

/// Random address inside 85.0.0.0/13, a Swiss residential block.
pub fn random_swiss_ip() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "85.{}.{}.{}",
        rng.gen_range(0..8),
        rng.gen_range(0..256),
        rng.gen_range(1..255)
    )
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("srgplay")
        .join("config.toml")
}
