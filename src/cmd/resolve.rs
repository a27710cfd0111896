use anyhow::{anyhow, Result};

use srgplay::resolve_media_ref;

pub fn cmd_resolve(url: &str) -> Result<()> {
    let media = resolve_media_ref(url).ok_or_else(|| anyhow!("Unsupported URL: {url}"))?;
    println!("{media}");
    Ok(())
}
