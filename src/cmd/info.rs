use anyhow::{Context, Result};

use srgplay::{ExtractError, ExtractorConfig, MediaInfo, ProviderRouter};

use super::output::{print_formats, print_summary};
use crate::OutputFormat;

pub async fn cmd_info(config: &ExtractorConfig, url: &str, format: OutputFormat) -> Result<()> {
    let info = extract(config, url).await?;

    match format {
        OutputFormat::Summary => print_summary(&info),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&info).context("failed to serialize")?;
            println!("{json}");
        }
    }

    Ok(())
}

pub async fn cmd_formats(config: &ExtractorConfig, url: &str) -> Result<()> {
    let info = extract(config, url).await?;
    print_formats(&info.formats);
    Ok(())
}

async fn extract(config: &ExtractorConfig, url: &str) -> Result<MediaInfo> {
    let router = ProviderRouter::from_config(config)?;
    eprintln!("📡 Fetching media info for: {url}");

    match router.extract(url).await {
        Ok(info) => Ok(info),
        Err(e) => {
            if e.is_geo_restricted() && !config.geo_bypass && config.x_forwarded_for.is_none() {
                eprintln!("🌍 Geo-restricted. Retry with --geo-bypass to use a Swiss address.");
            }
            Err(annotate(e))
        }
    }
}

fn annotate(err: ExtractError) -> anyhow::Error {
    if err.is_expected() {
        anyhow::Error::new(err)
    } else {
        anyhow::Error::new(err).context("extraction failed")
    }
}
