//! Port for fetching channel attachment pages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{ChannelKey, FetchDirection, RawAttachment};
use crate::domain::errors::SourceError;

/// One page request, as sent to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    /// Clan id.
    pub clan_id: String,
    /// Channel id.
    pub channel_id: String,
    /// Maximum number of attachments to return.
    pub limit: usize,
    /// Only attachments strictly older than this epoch second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    /// Only attachments strictly newer than this epoch second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
    /// Requested direction.
    pub direction: FetchDirection,
}

impl FetchRequest {
    /// Request for the most recent page.
    #[must_use]
    pub fn initial(channel: &ChannelKey, limit: usize) -> Self {
        Self {
            clan_id: channel.clan_id.clone(),
            channel_id: channel.channel_id.clone(),
            limit,
            before: None,
            after: None,
            direction: FetchDirection::Initial,
        }
    }

    /// Request for the page older than `before`.
    #[must_use]
    pub fn before(channel: &ChannelKey, before: i64, limit: usize) -> Self {
        Self {
            before: Some(before),
            direction: FetchDirection::Before,
            ..Self::initial(channel, limit)
        }
    }

    /// Request for the page newer than `after`.
    #[must_use]
    pub fn after(channel: &ChannelKey, after: i64, limit: usize) -> Self {
        Self {
            after: Some(after),
            direction: FetchDirection::After,
            ..Self::initial(channel, limit)
        }
    }
}

/// Page returned by the transport, in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    /// Raw attachment records.
    #[serde(default)]
    pub attachments: Vec<RawAttachment>,
}

impl FetchResponse {
    /// Wraps a list of records.
    #[must_use]
    pub const fn new(attachments: Vec<RawAttachment>) -> Self {
        Self { attachments }
    }
}

/// Port for fetching attachment pages from the transport collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentSourcePort: Send + Sync {
    /// Fetches one page of attachments.
    async fn fetch_attachments(&self, request: &FetchRequest)
    -> Result<FetchResponse, SourceError>;
}
