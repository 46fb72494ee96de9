//! Chat gallery - media attachment gallery engine for chat channels.
//!
//! This crate classifies channel attachments, pages them in both directions,
//! groups them into dated grid sections and packs multi-photo albums,
//! following a layered architecture with ports for the transport.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing use cases, services and DTOs.
pub mod application;
/// Domain layer containing entities, errors, algorithms and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "chat-gallery";
