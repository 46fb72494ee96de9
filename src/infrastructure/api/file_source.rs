//! Attachment pages served from a JSON dump on disk.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use super::dto::AttachmentPage;
use crate::domain::entities::{FetchDirection, RawAttachment};
use crate::domain::errors::SourceError;
use crate::domain::ports::{AttachmentSourcePort, FetchRequest, FetchResponse};

/// Serves a fixed set of attachments the way the API pages them.
///
/// Records are kept newest first. `before` and `after` bounds are strict and
/// compared in epoch seconds. Records carrying a channel id are only served for
/// that channel. Records without a readable timestamp only appear in the
/// initial page.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    attachments: Vec<RawAttachment>,
}

impl JsonFileSource {
    /// Wraps already parsed records.
    #[must_use]
    pub fn new(mut attachments: Vec<RawAttachment>) -> Self {
        attachments.sort_by_key(|raw| std::cmp::Reverse(sort_key(raw)));
        Self { attachments }
    }

    /// Parses a dump: either a bare array or `{ "attachments": [...] }`.
    ///
    /// # Errors
    /// Returns error if the JSON cannot be parsed.
    pub fn from_json(content: &str) -> Result<Self, SourceError> {
        let page: AttachmentPage = serde_json::from_str(content)
            .map_err(|e| SourceError::decode(format!("invalid attachment dump: {e}")))?;
        Ok(Self::new(page.into_attachments()))
    }

    /// Reads and parses a dump file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self, SourceError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::io(format!("{}: {e}", path.display())))?;
        let source = Self::from_json(&content)?;
        info!(path = %path.display(), records = source.len(), "Loaded attachment dump");
        Ok(source)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    /// Returns true if the dump holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }

    fn in_channel<'a>(
        &'a self,
        channel_id: &'a str,
    ) -> impl Iterator<Item = &'a RawAttachment> + 'a {
        self.attachments.iter().filter(move |raw| {
            raw.channel_id
                .as_deref()
                .is_none_or(|id| id == channel_id)
        })
    }
}

/// Undated records sort as newest.
fn sort_key(raw: &RawAttachment) -> i64 {
    raw.create_time
        .map_or(i64::MAX, |time| time.timestamp_millis())
}

fn epoch_seconds(raw: &RawAttachment) -> Option<i64> {
    raw.create_time.map(|time| time.timestamp())
}

#[async_trait]
impl AttachmentSourcePort for JsonFileSource {
    async fn fetch_attachments(
        &self,
        request: &FetchRequest,
    ) -> Result<FetchResponse, SourceError> {
        let channel = self.in_channel(&request.channel_id);

        let page: Vec<RawAttachment> = match request.direction {
            FetchDirection::Initial => channel.take(request.limit).cloned().collect(),
            FetchDirection::Before => {
                let before = request.before.unwrap_or(i64::MAX);
                channel
                    .filter(|raw| epoch_seconds(raw).is_some_and(|ts| ts < before))
                    .take(request.limit)
                    .cloned()
                    .collect()
            }
            FetchDirection::After => {
                let after = request.after.unwrap_or(i64::MIN);
                let newer: Vec<&RawAttachment> = channel
                    .filter(|raw| epoch_seconds(raw).is_some_and(|ts| ts > after))
                    .collect();
                // Closest to the cursor first, so no gap opens above the held items.
                let skip = newer.len().saturating_sub(request.limit);
                newer.into_iter().skip(skip).cloned().collect()
            }
        };

        debug!(
            channel = %request.channel_id,
            direction = %request.direction,
            returned = page.len(),
            "Served attachment page from dump"
        );

        Ok(FetchResponse::new(page))
    }
}
