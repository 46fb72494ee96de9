//! Data transfer objects for the application layer.

mod pagination_dto;

pub use pagination_dto::{FetchOutcome, PageSummary, SkipReason};
