//! Domain error types.

mod gallery_error;
mod source_error;

pub use gallery_error::GalleryError;
pub use source_error::SourceError;
