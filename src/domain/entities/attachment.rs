use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::serde_utils::{flexible_timestamp, string_or_number};

/// Identity of an attachment: its server id, or the `url`+`filename` composite
/// when the record carries no id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttachmentKey(String);

impl AttachmentKey {
    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttachmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attachment as it arrives from the transport, before normalization.
///
/// Timestamps may be ISO strings or epoch numbers and ids may be strings or
/// numbers; both camelCase and `snake_case` field names are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RawAttachment {
    #[serde(default, deserialize_with = "string_or_number::deserialize")]
    pub id: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub filetype: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default, alias = "create_time", with = "flexible_timestamp")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "sender_id",
        deserialize_with = "string_or_number::deserialize"
    )]
    pub sender_id: Option<String>,
    #[serde(
        default,
        alias = "message_id",
        deserialize_with = "string_or_number::deserialize"
    )]
    pub message_id: Option<String>,
    #[serde(
        default,
        alias = "channel_id",
        deserialize_with = "string_or_number::deserialize"
    )]
    pub channel_id: Option<String>,
}

impl RawAttachment {
    /// Normalizes the record into an [`Attachment`].
    /// A missing or unreadable timestamp is replaced by `now`.
    #[must_use]
    pub fn normalize(self, now: DateTime<Utc>) -> Attachment {
        let create_time = self.create_time.unwrap_or_else(|| {
            debug!(
                id = self.id.as_deref().unwrap_or("-"),
                url = %self.url,
                "Attachment has no readable timestamp, using current time"
            );
            now
        });

        Attachment {
            id: self.id,
            url: self.url,
            filename: self.filename,
            filetype: self.filetype,
            width: self.width,
            height: self.height,
            create_time,
            sender_id: self.sender_id,
            message_id: self.message_id,
            channel_id: self.channel_id,
        }
    }
}

/// Normalizes a batch of raw records against a single clock reading.
#[must_use]
pub fn normalize_all(raw: Vec<RawAttachment>, now: DateTime<Utc>) -> Vec<Attachment> {
    raw.into_iter().map(|r| r.normalize(now)).collect()
}

/// Channel attachment with a canonical UTC timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Attachment {
    id: Option<String>,
    url: String,
    filename: String,
    filetype: String,
    width: Option<u32>,
    height: Option<u32>,
    create_time: DateTime<Utc>,
    sender_id: Option<String>,
    message_id: Option<String>,
    channel_id: Option<String>,
}

#[allow(missing_docs)]
impl Attachment {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        filename: impl Into<String>,
        filetype: impl Into<String>,
        create_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            url: url.into(),
            filename: filename.into(),
            filetype: filetype.into(),
            width: None,
            height: None,
            create_time,
            sender_id: None,
            message_id: None,
            channel_id: None,
        }
    }

    #[must_use]
    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    #[must_use]
    pub const fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    #[must_use]
    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    #[must_use]
    pub const fn with_create_time(mut self, create_time: DateTime<Utc>) -> Self {
        self.create_time = create_time;
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Identity used for de-duplication.
    #[must_use]
    pub fn key(&self) -> AttachmentKey {
        match &self.id {
            Some(id) => AttachmentKey(id.clone()),
            None => AttachmentKey(format!("{}|{}", self.url, self.filename)),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn filetype(&self) -> &str {
        &self.filetype
    }

    #[must_use]
    pub const fn width(&self) -> Option<u32> {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> Option<u32> {
        self.height
    }

    #[must_use]
    pub const fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    /// Creation time as whole epoch seconds, rounded down.
    #[must_use]
    pub const fn epoch_seconds(&self) -> i64 {
        self.create_time.timestamp()
    }

    #[must_use]
    pub fn sender_id(&self) -> Option<&str> {
        self.sender_id.as_deref()
    }

    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    #[must_use]
    pub fn channel_id(&self) -> Option<&str> {
        self.channel_id.as_deref()
    }

    pub(crate) fn set_origin(&mut self, sender_id: Option<&str>, create_time: DateTime<Utc>) {
        if let Some(sender) = sender_id {
            self.sender_id = Some(sender.to_string());
        }
        self.create_time = create_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_prefers_id() {
        let at = Utc::now();
        let with_id = Attachment::new("a1", "https://x/a.png", "a.png", "image/png", at);
        let without_id = with_id.clone().without_id();

        assert_eq!(with_id.key().as_str(), "a1");
        assert_eq!(without_id.key().as_str(), "https://x/a.png|a.png");
    }

    #[test]
    fn test_raw_snake_case_payload() {
        let json = r#"{
            "id": 99,
            "url": "https://cdn.example.com/f.jpg",
            "filename": "f.jpg",
            "filetype": "image/jpeg",
            "width": 640,
            "height": 480,
            "create_time": 1704189600,
            "sender_id": "u1",
            "message_id": "m1",
            "channel_id": "c1"
        }"#;
        let raw: RawAttachment = serde_json::from_str(json).unwrap();
        let attachment = raw.normalize(Utc::now());

        assert_eq!(attachment.id(), Some("99"));
        assert_eq!(attachment.width(), Some(640));
        assert_eq!(attachment.epoch_seconds(), 1_704_189_600);
        assert_eq!(attachment.sender_id(), Some("u1"));
        assert_eq!(attachment.channel_id(), Some("c1"));
    }

    #[test]
    fn test_malformed_timestamp_falls_back_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let raw: RawAttachment =
            serde_json::from_str(r#"{"id": "x", "createTime": "yesterday-ish"}"#).unwrap();

        assert_eq!(raw.normalize(now).create_time(), now);
    }

    #[test]
    fn test_structured_timestamp_keeps_rest_of_page() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let page: Vec<RawAttachment> = serde_json::from_str(
            r#"[
                {"id": "a", "createTime": {"seconds": 1}},
                {"id": "b", "createTime": 1704189600}
            ]"#,
        )
        .unwrap();

        let items = normalize_all(page, now);
        assert_eq!(items.len(), 2);
        let stamps: Vec<_> = items.iter().map(|a| (a.id(), a.create_time())).collect();
        assert!(stamps.contains(&(Some("a"), now)));
        assert!(stamps.iter().any(|(id, at)| *id == Some("b") && at.timestamp() == 1_704_189_600));
    }
}
