//! Use case implementations.

mod paginate_attachments;

pub use paginate_attachments::{
    AttachmentPaginator, DEFAULT_END_REACHED_THRESHOLD, DEFAULT_PAGE_LIMIT, PaginatorConfig,
};
