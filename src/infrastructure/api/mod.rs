//! Adapters for the attachment fetch port.

pub mod client;
pub mod dto;
pub mod file_source;

pub use client::HttpAttachmentSource;
pub use file_source::JsonFileSource;
