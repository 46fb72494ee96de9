//! Application layer with use cases, services and DTOs.

/// Data transfer objects.
pub mod dto;
/// Application services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{FetchOutcome, PageSummary, SkipReason};
pub use services::{ChannelReport, ChannelReporter, GalleryPage, GalleryView};
pub use use_cases::{AttachmentPaginator, PaginatorConfig};
