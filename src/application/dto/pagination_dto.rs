//! Pagination DTOs.

use serde::Serialize;

use crate::domain::entities::FetchDirection;

/// Why a fetch was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// Another fetch for the channel is still running.
    InFlight,
    /// The server has no more items in that direction.
    Exhausted,
    /// The channel holds no items to derive a cursor from.
    NoCursor,
}

impl SkipReason {
    /// Returns human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InFlight => "a fetch is already in flight",
            Self::Exhausted => "no more items in this direction",
            Self::NoCursor => "no cursor available",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Result of an applied page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    /// Direction of the page.
    pub direction: FetchDirection,
    /// Items returned by the source.
    pub returned: usize,
    /// Items that were new to the channel.
    pub added: usize,
    /// Channel item count after the merge.
    pub total: usize,
    /// Whether more items may exist in that direction.
    pub has_more: bool,
}

/// Outcome of a pagination call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum FetchOutcome {
    /// The page was merged into the channel state.
    Applied(PageSummary),
    /// No request was sent.
    Skipped {
        /// Reason the guard refused.
        reason: SkipReason,
    },
    /// The channel was evicted while the request was in flight.
    Discarded,
}

impl FetchOutcome {
    /// Returns the summary if the page was applied.
    #[must_use]
    pub const fn summary(&self) -> Option<&PageSummary> {
        match self {
            Self::Applied(summary) => Some(summary),
            _ => None,
        }
    }

    /// Returns true if a page was merged.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}
