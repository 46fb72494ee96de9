//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::use_cases::{
    DEFAULT_END_REACHED_THRESHOLD, DEFAULT_PAGE_LIMIT, PaginatorConfig,
};
use crate::application::services::DEFAULT_CHUNK_SIZE;
use crate::domain::services::AlbumConstraints;
use crate::infrastructure::image::{DEFAULT_MAX_LOADED_CACHE, PreloaderConfig};
use crate::infrastructure::image::render_url::{DEFAULT_CDN_HOSTS, DEFAULT_HEIGHT, DEFAULT_WIDTH};

const APP_NAME: &str = "chat-gallery";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "chat-gallery";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Pagination and grid settings.
    #[serde(default)]
    pub gallery: GalleryConfig,

    /// Album packing settings.
    #[serde(default)]
    pub album: AlbumConfig,

    /// Remote source and thumbnail settings.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Pagination and grid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Grid columns per row.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of loaded render URLs remembered.
    #[serde(default = "default_max_loaded_cache")]
    pub max_loaded_cache: usize,

    /// Fraction of the viewport that triggers the next page.
    #[serde(default = "default_end_reached_threshold")]
    pub end_reached_threshold: f64,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            chunk_size: default_chunk_size(),
            max_loaded_cache: default_max_loaded_cache(),
            end_reached_threshold: default_end_reached_threshold(),
        }
    }
}

impl GalleryConfig {
    /// Paginator settings.
    #[must_use]
    pub const fn paginator(&self) -> PaginatorConfig {
        PaginatorConfig {
            limit: self.limit,
            end_reached_threshold: self.end_reached_threshold,
        }
    }
}

/// Album packing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumConfig {
    /// Height cap on wide screens.
    #[serde(default = "default_max_height_desktop")]
    pub max_height_desktop: f64,

    /// Height cap on phones.
    #[serde(default = "default_max_height_mobile")]
    pub max_height_mobile: f64,

    /// Minimum cell side. The device default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cell_size: Option<f64>,

    /// Gap between cells.
    #[serde(default)]
    pub spacing: f64,
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            max_height_desktop: default_max_height_desktop(),
            max_height_mobile: default_max_height_mobile(),
            min_cell_size: None,
            spacing: 0.0,
        }
    }
}

impl AlbumConfig {
    /// Packing constraints for the device class.
    #[must_use]
    pub fn constraints(&self, is_mobile: bool) -> AlbumConstraints {
        let base = AlbumConstraints::for_device(is_mobile);
        AlbumConstraints {
            max_height: if is_mobile {
                self.max_height_mobile
            } else {
                self.max_height_desktop
            },
            min_cell_size: self.min_cell_size.unwrap_or(base.min_cell_size),
            spacing: self.spacing,
            ..base
        }
    }
}

/// Remote source and thumbnail configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the attachment API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Thumbnail width requested from the CDN.
    #[serde(default = "default_render_width")]
    pub render_width: u32,

    /// Thumbnail height requested from the CDN.
    #[serde(default = "default_render_height")]
    pub render_height: u32,

    /// Hosts that accept resize parameters.
    #[serde(default = "default_cdn_hosts")]
    pub cdn_hosts: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
            render_width: default_render_width(),
            render_height: default_render_height(),
            cdn_hosts: default_cdn_hosts(),
        }
    }
}

impl ApiConfig {
    /// Thumbnail settings.
    #[must_use]
    pub fn preloader(&self) -> PreloaderConfig {
        PreloaderConfig {
            width: self.render_width,
            height: self.render_height,
            cdn_hosts: self.cdn_hosts.clone(),
        }
    }
}

const fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

const fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

const fn default_max_loaded_cache() -> usize {
    DEFAULT_MAX_LOADED_CACHE
}

const fn default_end_reached_threshold() -> f64 {
    DEFAULT_END_REACHED_THRESHOLD
}

const fn default_max_height_desktop() -> f64 {
    AlbumConstraints::DESKTOP.max_height
}

const fn default_max_height_mobile() -> f64 {
    AlbumConstraints::MOBILE.max_height
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_render_width() -> u32 {
    DEFAULT_WIDTH
}

const fn default_render_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_cdn_hosts() -> Vec<String> {
    DEFAULT_CDN_HOSTS.iter().map(ToString::to_string).collect()
}

use super::args::CliArgs;

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(limit) = args.limit {
            self.gallery.limit = limit;
        }
        if let Some(chunk_size) = args.chunk_size {
            self.gallery.chunk_size = chunk_size;
        }
        if let Some(api_url) = &args.api_url {
            self.api.base_url = Some(api_url.clone());
        }
        if let Some(timeout) = args.timeout_secs {
            self.api.timeout_secs = timeout;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("chat-gallery.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            gallery: GalleryConfig::default(),
            album: AlbumConfig::default(),
            api: ApiConfig::default(),
        }
    }
}
