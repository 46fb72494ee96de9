use super::app_config::LogLevel;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable listing.
    #[default]
    Text,
    /// One JSON document.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "chat-gallery",
    version,
    about = "Browse the media attachments of chat channels as a dated gallery",
    long_about = None
)]
pub struct CliArgs {
    /// JSON dump of attachments to read instead of the API.
    #[arg(value_name = "DUMP", conflicts_with = "api_url")]
    pub dump: Option<PathBuf>,

    /// Base URL of the attachment API.
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Clan the channels belong to.
    #[arg(long)]
    pub clan: String,

    /// Channel to load. Repeat to load several channels concurrently.
    #[arg(long = "channel", required = true)]
    pub channels: Vec<String>,

    /// Stop after this many pages per channel.
    #[arg(long)]
    pub pages: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Container width used for album layouts.
    #[arg(long, default_value_t = 480.0)]
    pub width: f64,

    /// Use phone album constraints.
    #[arg(long)]
    pub mobile: bool,

    /// Page size.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Grid columns per row.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,
}
