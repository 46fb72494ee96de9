use serde::{Deserialize, Serialize};

use crate::domain::entities::RawAttachment;
use crate::domain::ports::FetchRequest;

/// Query string of the attachment listing endpoint.
#[derive(Debug, Serialize)]
pub struct AttachmentQuery {
    /// Page size.
    pub limit: usize,
    /// Strictly older than this epoch second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    /// Strictly newer than this epoch second.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

impl From<&FetchRequest> for AttachmentQuery {
    fn from(request: &FetchRequest) -> Self {
        Self {
            limit: request.limit,
            before: request.before,
            after: request.after,
        }
    }
}

/// Attachment listing body: either a bare array or wrapped in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AttachmentPage {
    /// `[...]`
    Bare(Vec<RawAttachment>),
    /// `{ "attachments": [...] }`
    Wrapped {
        /// Records in server order.
        #[serde(default)]
        attachments: Vec<RawAttachment>,
    },
}

impl AttachmentPage {
    /// Records in server order.
    #[must_use]
    pub fn into_attachments(self) -> Vec<RawAttachment> {
        match self {
            Self::Bare(attachments) | Self::Wrapped { attachments } => attachments,
        }
    }
}

/// API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error message from the server.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accepts_both_shapes() {
        let wrapped: AttachmentPage =
            serde_json::from_str(r#"{"attachments":[{"id":"1","url":"u"}]}"#).unwrap();
        let bare: AttachmentPage = serde_json::from_str(r#"[{"id":2,"url":"v"}]"#).unwrap();

        assert_eq!(wrapped.into_attachments()[0].id.as_deref(), Some("1"));
        assert_eq!(bare.into_attachments()[0].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_query_skips_missing_cursors() {
        let query = AttachmentQuery {
            limit: 50,
            before: Some(1_704_189_600),
            after: None,
        };

        let json = serde_json::to_value(&query).unwrap();

        assert_eq!(json["limit"], 50);
        assert_eq!(json["before"], 1_704_189_600_i64);
        assert!(json.get("after").is_none());
    }
}
