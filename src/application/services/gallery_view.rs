//! Sectioned, row-chunked gallery view with content-hash memoization.

use std::sync::Arc;

use chrono::{Local, TimeZone};
use parking_lot::Mutex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::domain::entities::{Attachment, DateSection, Row};
use crate::domain::services::{chunk_into_rows, group_by_year_day_in};

/// Default number of grid columns.
pub const DEFAULT_CHUNK_SIZE: usize = 3;

/// One day of the gallery with its grid rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GallerySection {
    /// Day header and items.
    #[serde(flatten)]
    pub section: DateSection<Attachment>,
    /// Items of the day split into grid rows.
    pub rows: Vec<Row<Attachment>>,
}

/// Everything a sticky-header grid needs to render a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GalleryPage {
    /// Content hash the page was built from.
    pub hash: String,
    /// Day sections, newest first.
    pub sections: Vec<GallerySection>,
}

impl GalleryPage {
    /// Total number of items across sections.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.section.len()).sum()
    }
}

/// Builds gallery pages, reusing the last one while the input is unchanged.
pub struct GalleryView<Tz: TimeZone = Local> {
    chunk_size: usize,
    tz: Tz,
    last: Mutex<Option<Arc<GalleryPage>>>,
}

impl GalleryView<Local> {
    /// Creates a view in the local time zone.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self::with_timezone(chunk_size, Local)
    }
}

impl Default for GalleryView<Local> {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl<Tz: TimeZone> GalleryView<Tz> {
    /// Creates a view grouping days in `tz`.
    #[must_use]
    pub fn with_timezone(chunk_size: usize, tz: Tz) -> Self {
        Self {
            chunk_size,
            tz,
            last: Mutex::new(None),
        }
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Builds the page for `items`; `seed` namespaces the row keys.
    pub fn build(&self, seed: &str, items: &[Attachment]) -> Arc<GalleryPage> {
        let hash = content_hash(seed, self.chunk_size, items);

        let mut last = self.last.lock();
        if let Some(page) = last.as_ref().filter(|p| p.hash == hash) {
            trace!(hash = %hash, "Reusing gallery page");
            return Arc::clone(page);
        }

        let sections = group_by_year_day_in(items, Attachment::create_time, &self.tz)
            .into_iter()
            .map(|section| {
                let row_seed = format!("{seed}_{}", section.day_ts);
                let rows = chunk_into_rows(&section.items, self.chunk_size, &row_seed);
                GallerySection { section, rows }
            })
            .collect();

        trace!(hash = %hash, items = items.len(), "Built gallery page");
        let page = Arc::new(GalleryPage { hash, sections });
        *last = Some(Arc::clone(&page));
        page
    }

    /// Drops the memoized page.
    pub fn invalidate(&self) {
        *self.last.lock() = None;
    }
}

/// Hash of everything the page depends on.
fn content_hash(seed: &str, chunk_size: usize, items: &[Attachment]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(chunk_size.to_le_bytes());
    for item in items {
        hasher.update(item.key().as_str().as_bytes());
        hasher.update([0_u8]);
        hasher.update(item.create_time().timestamp_millis().to_le_bytes());
    }
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(id: &str, iso: &str) -> Attachment {
        let at = chrono::DateTime::parse_from_rfc3339(iso)
            .unwrap()
            .with_timezone(&Utc);
        Attachment::new(id, format!("https://x/{id}"), id, "image/png", at)
    }

    fn sample() -> Vec<Attachment> {
        vec![
            item("a", "2024-01-02T10:00:00Z"),
            item("b", "2024-01-02T09:00:00Z"),
            item("c", "2024-01-02T08:00:00Z"),
            item("d", "2024-01-02T07:00:00Z"),
            item("e", "2023-12-31T23:00:00Z"),
        ]
    }

    #[test]
    fn test_sections_are_chunked_into_rows() {
        let view = GalleryView::with_timezone(3, Utc);

        let page = view.build("gallery", &sample());

        assert_eq!(page.sections.len(), 2);
        assert_eq!(page.item_count(), 5);
        let day = &page.sections[0];
        assert_eq!(day.rows.len(), 2);
        assert_eq!(day.rows[0].items.len(), 3);
        assert!(day.rows[0].key.starts_with("gallery_1704153600000_row_0_a_b_c"));
    }

    #[test]
    fn test_unchanged_input_reuses_page() {
        let view = GalleryView::with_timezone(3, Utc);
        let items = sample();

        let first = view.build("gallery", &items);
        let second = view.build("gallery", &items);

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_changed_input_rebuilds() {
        let view = GalleryView::with_timezone(3, Utc);
        let mut items = sample();

        let first = view.build("gallery", &items);
        items.push(item("f", "2023-06-01T12:00:00Z"));
        let second = view.build("gallery", &items);

        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first.hash, second.hash);
        assert_eq!(second.sections.len(), 3);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let view = GalleryView::with_timezone(2, Utc);
        let items = sample();

        let first = view.build("g", &items);
        view.invalidate();
        let second = view.build("g", &items);

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }
}
