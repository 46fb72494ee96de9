//! Gallery engine error types.

use thiserror::Error;

use super::SourceError;
use crate::domain::entities::{ChannelKey, FetchDirection};

/// Errors surfaced by the gallery engine to its caller.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// A page fetch failed; the channel state was left untouched.
    #[error("failed to fetch {direction} page for channel {channel}: {source}")]
    FetchFailed {
        /// Channel the fetch was issued for.
        channel: ChannelKey,
        /// Requested direction.
        direction: FetchDirection,
        /// Underlying source failure.
        #[source]
        source: SourceError,
    },

    /// The channel has never been opened.
    #[error("channel {0} has no gallery state")]
    UnknownChannel(ChannelKey),
}

impl GalleryError {
    /// Creates fetch failure error.
    #[must_use]
    pub const fn fetch_failed(
        channel: ChannelKey,
        direction: FetchDirection,
        source: SourceError,
    ) -> Self {
        Self::FetchFailed {
            channel,
            direction,
            source,
        }
    }

    /// Returns whether the caller may retry the failed operation.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::FetchFailed { source, .. } => source.is_recoverable(),
            Self::UnknownChannel(_) => false,
        }
    }
}
