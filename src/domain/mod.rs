//! Domain layer with core gallery entities, algorithms and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;
/// Pure gallery algorithms.
pub mod services;

pub use entities::{Attachment, AttachmentKind, ChannelKey, PaginationState};
pub use errors::{GalleryError, SourceError};
pub use ports::{AttachmentSourcePort, PreloadCachePort};
