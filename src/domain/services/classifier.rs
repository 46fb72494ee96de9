//! Attachment classification into exclusive media kinds.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::domain::entities::{Attachment, AttachmentKind, ClassifiedAttachments};

/// Media types the client cannot play inline; always shown as files.
const UNSUPPORTED_FILETYPES: &[&str] = &[
    "image/heic",
    "image/heif",
    "image/tiff",
    "image/x-icon",
    "image/vnd.adobe.photoshop",
    "video/x-msvideo",
    "video/x-ms-wmv",
    "video/x-flv",
    "video/x-matroska",
    "video/avi",
    "video/3gpp",
];

/// Transport-stream segment types, never standalone videos.
const SEGMENT_FILETYPES: &[&str] = &["video/mp2t", "video/vnd.dlna.mpeg-tts", "ts"];

static EMBED_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?:[a-z0-9-]+\.)*(?:youtube\.com|youtu\.be|vimeo\.com|tiktok\.com|twitch\.tv|dailymotion\.com)/",
    )
    .expect("Invalid regex")
});

/// Sender and time of the message carrying the attachments.
#[derive(Debug, Clone, Copy)]
pub struct MessageOrigin<'a> {
    /// Message author.
    pub sender_id: Option<&'a str>,
    /// Message creation time.
    pub create_time: DateTime<Utc>,
}

/// Assigns every attachment exactly one [`AttachmentKind`].
pub struct AttachmentClassifier;

impl AttachmentClassifier {
    /// Kind of a single attachment. First matching rule wins.
    #[must_use]
    pub fn kind_of(attachment: &Attachment) -> AttachmentKind {
        let filetype = attachment.filetype().trim().to_ascii_lowercase();
        let url = attachment.url();

        if is_unsupported(&filetype) {
            AttachmentKind::Document
        } else if is_video(&filetype, url) {
            AttachmentKind::Video
        } else if is_image(&filetype, url) {
            AttachmentKind::Image
        } else if filetype.starts_with("audio/") {
            AttachmentKind::Audio
        } else {
            AttachmentKind::Document
        }
    }

    /// Partitions attachments by kind, preserving input order within each bucket.
    #[must_use]
    pub fn classify(attachments: &[Attachment]) -> ClassifiedAttachments {
        let mut classified = ClassifiedAttachments::default();
        for attachment in attachments {
            classified.push(Self::kind_of(attachment), attachment.clone());
        }
        classified
    }

    /// Like [`Self::classify`], stamping the message's sender and time onto
    /// image records for downstream grouping.
    #[must_use]
    pub fn classify_message(
        attachments: &[Attachment],
        origin: MessageOrigin<'_>,
    ) -> ClassifiedAttachments {
        let mut classified = ClassifiedAttachments::default();
        for attachment in attachments {
            let kind = Self::kind_of(attachment);
            let mut record = attachment.clone();
            if kind == AttachmentKind::Image {
                record.set_origin(origin.sender_id, origin.create_time);
            }
            classified.push(kind, record);
        }
        classified
    }
}

fn is_unsupported(filetype: &str) -> bool {
    UNSUPPORTED_FILETYPES.contains(&filetype)
}

fn is_segment(filetype: &str) -> bool {
    SEGMENT_FILETYPES.contains(&filetype)
}

fn is_embed_url(url: &str) -> bool {
    EMBED_URL_RE.is_match(url)
}

fn is_video(filetype: &str, url: &str) -> bool {
    let container = matches!(filetype, "mp4" | "mov" | "video/mp4" | "video/quicktime");
    (container && !is_embed_url(url)) || (filetype.starts_with("video/") && !is_segment(filetype))
}

fn is_image(filetype: &str, url: &str) -> bool {
    let known = filetype.contains("png")
        || filetype.contains("jpeg")
        || filetype.contains("jpg")
        || (filetype.starts_with("image/") && !filetype.contains("svg+xml"));
    known || url_path(url).to_ascii_lowercase().ends_with(".gif")
}

/// URL without query string or fragment.
fn url_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
