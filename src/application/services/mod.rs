//! Application services.

pub mod channel_report;
pub mod gallery_view;

pub use channel_report::{ChannelReport, ChannelReporter, KindCounts, MessageAlbum};
pub use gallery_view::{DEFAULT_CHUNK_SIZE, GalleryPage, GallerySection, GalleryView};
