//! Image handling infrastructure.
//!
//! This module provides:
//! - FIFO memory of loaded render URLs
//! - CDN resize URL resolution
//! - Thumbnail resolution for the renderer

pub mod preload_cache;
pub mod preloader;
pub mod render_url;

pub use preload_cache::{CacheStats, DEFAULT_MAX_LOADED_CACHE, MediaPreloadCache};
pub use preloader::{ImagePreloader, PreloaderConfig, ResolvedImage};
pub use render_url::{is_cdn_url, resolve_render_url, resolve_render_url_for};
