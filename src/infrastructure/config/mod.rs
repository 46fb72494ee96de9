//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{AlbumConfig, ApiConfig, AppConfig, GalleryConfig, LogLevel};
pub use args::{CliArgs, OutputFormat};
pub use storage::{ConfigError, ConfigStore};
