//! Render-URL resolution backed by the loaded-URL cache.

use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use super::render_url::{DEFAULT_CDN_HOSTS, DEFAULT_HEIGHT, DEFAULT_WIDTH, resolve_render_url_for};
use crate::domain::entities::Attachment;
use crate::domain::ports::PreloadCachePort;

/// Thumbnail size and CDN hosts used to build render URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloaderConfig {
    /// Target width.
    pub width: u32,
    /// Target height.
    pub height: u32,
    /// Hosts that accept resize parameters.
    pub cdn_hosts: Vec<String>,
}

impl Default for PreloaderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            cdn_hosts: DEFAULT_CDN_HOSTS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// What the renderer needs to show one thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImage {
    /// URL to load.
    pub url: String,
    /// True when the URL already loaded once, so no placeholder is needed.
    pub already_loaded: bool,
}

/// Resolves thumbnails and records completed loads.
pub struct ImagePreloader {
    cache: Arc<dyn PreloadCachePort>,
    config: PreloaderConfig,
}

impl ImagePreloader {
    /// Creates a preloader over a shared cache.
    #[must_use]
    pub fn new(cache: Arc<dyn PreloadCachePort>, config: PreloaderConfig) -> Self {
        Self { cache, config }
    }

    /// Render URL of an attachment.
    #[must_use]
    pub fn render_url(&self, attachment: &Attachment) -> String {
        resolve_render_url_for(
            attachment.url(),
            self.config.width,
            self.config.height,
            &self.config.cdn_hosts,
        )
    }

    /// Render URL plus whether it has loaded before.
    #[must_use]
    pub fn resolve(&self, attachment: &Attachment) -> ResolvedImage {
        let url = self.render_url(attachment);
        let already_loaded = self.cache.has(&url);
        trace!(url = %url, already_loaded, "Resolved thumbnail");
        ResolvedImage {
            url,
            already_loaded,
        }
    }

    /// Records that the attachment's render URL finished loading.
    pub fn mark_loaded(&self, attachment: &Attachment) {
        self.cache.remember(&self.render_url(attachment));
    }

    /// Shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn PreloadCachePort> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::image::MediaPreloadCache;
    use chrono::Utc;

    fn photo(url: &str) -> Attachment {
        Attachment::new("1", url, "p.png", "image/png", Utc::now())
    }

    #[test]
    fn test_resolve_before_and_after_load() {
        let preloader = ImagePreloader::new(
            Arc::new(MediaPreloadCache::new(10)),
            PreloaderConfig::default(),
        );
        let item = photo("https://cdn.example.com/p.png");

        let first = preloader.resolve(&item);
        preloader.mark_loaded(&item);
        let second = preloader.resolve(&item);

        assert!(!first.already_loaded);
        assert!(second.already_loaded);
        assert_eq!(first.url, second.url);
        assert!(first.url.contains("width=320"));
    }

    #[test]
    fn test_cache_is_keyed_by_render_url() {
        let cache = Arc::new(MediaPreloadCache::new(10));
        let preloader = ImagePreloader::new(cache.clone(), PreloaderConfig::default());
        let item = photo("https://cdn.example.com/p.png");

        preloader.mark_loaded(&item);

        assert!(!cache.has("https://cdn.example.com/p.png"));
        assert!(cache.has(&preloader.render_url(&item)));
    }
}
