//! `srgplay` CLI - inspect SRG SSR media from the command line

mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use srgplay::ExtractorConfig;

#[derive(Parser)]
#[command(name = "srgplay")]
#[command(about = "Media extractor for the SRG SSR play sites")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.config/srgplay/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend to be in Switzerland via a random Swiss X-Forwarded-For address
    #[arg(long, global = true)]
    geo_bypass: bool,

    /// Send this X-Forwarded-For address with every request
    #[arg(long, global = true, value_name = "IP")]
    x_forwarded_for: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show title, metadata, formats and subtitles for a URL
    Info {
        /// Play-site URL, tp.srgssr.ch player URL or srgssr:{bu}:{type}:{id}
        url: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        format: OutputFormat,
    },

    /// Print the extracted media info as pretty JSON
    Json {
        /// Play-site URL, tp.srgssr.ch player URL or srgssr:{bu}:{type}:{id}
        url: String,
    },

    /// List available formats, worst to best
    Formats {
        /// Play-site URL, tp.srgssr.ch player URL or srgssr:{bu}:{type}:{id}
        url: String,
    },

    /// Print the canonical srgssr:{bu}:{type}:{id} for a URL (no network)
    Resolve {
        /// Play-site URL or tp.srgssr.ch player URL
        url: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Pretty-printed JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Info { ref url, format } => {
            let config = load_config(&cli)?;
            cmd::info::cmd_info(&config, url, format).await?;
        }
        Commands::Json { ref url } => {
            let config = load_config(&cli)?;
            cmd::info::cmd_info(&config, url, OutputFormat::Json).await?;
        }
        Commands::Formats { ref url } => {
            let config = load_config(&cli)?;
            cmd::info::cmd_formats(&config, url).await?;
        }
        Commands::Resolve { ref url } => {
            cmd::resolve::cmd_resolve(url)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "srgplay=debug",
        _ => "srgplay=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(cli: &Cli) -> Result<ExtractorConfig> {
    let mut config = match &cli.config {
        Some(path) => ExtractorConfig::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExtractorConfig::load().context("failed to load config")?,
    };

    if cli.geo_bypass {
        config.geo_bypass = true;
    }
    if let Some(ip) = &cli.x_forwarded_for {
        config.x_forwarded_for = Some(ip.clone());
    }

    Ok(config)
}
