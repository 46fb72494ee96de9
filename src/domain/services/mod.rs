//! Pure gallery algorithms.

pub mod album_layout;
pub mod classifier;
pub mod date_grouper;
pub mod row_chunker;

pub use album_layout::{AlbumConstraints, AlbumLayoutEngine, calculate_album_layout};
pub use classifier::{AttachmentClassifier, MessageOrigin};
pub use date_grouper::{group_by_year_day, group_by_year_day_in};
pub use row_chunker::{RowKeyed, chunk_into_rows};
