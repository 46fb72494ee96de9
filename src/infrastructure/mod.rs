//! Infrastructure layer with external service adapters.

/// Attachment API and dump-file sources.
pub mod api;
/// Application configuration.
pub mod config;
/// Render URLs and the loaded-image cache.
pub mod image;

pub use api::{HttpAttachmentSource, JsonFileSource};
pub use config::{AppConfig, CliArgs, ConfigStore, LogLevel, OutputFormat};
pub use image::{CacheStats, ImagePreloader, MediaPreloadCache, resolve_render_url};
