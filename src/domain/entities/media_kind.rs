use serde::{Deserialize, Serialize};

use super::Attachment;

/// Exclusive media kind assigned to every attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    /// Renderable still or animated image.
    Image,
    /// Playable video file.
    Video,
    /// Playable audio file.
    Audio,
    /// Anything else, shown as a downloadable file.
    Document,
}

impl AttachmentKind {
    /// Returns a human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Attachments of one message partitioned by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassifiedAttachments {
    /// Video attachments.
    pub videos: Vec<Attachment>,
    /// Image attachments.
    pub images: Vec<Attachment>,
    /// Document attachments, including unsupported media.
    pub documents: Vec<Attachment>,
    /// Audio attachments.
    pub audio: Vec<Attachment>,
}

impl ClassifiedAttachments {
    /// Adds an attachment to the bucket for `kind`.
    pub fn push(&mut self, kind: AttachmentKind, attachment: Attachment) {
        match kind {
            AttachmentKind::Image => self.images.push(attachment),
            AttachmentKind::Video => self.videos.push(attachment),
            AttachmentKind::Audio => self.audio.push(attachment),
            AttachmentKind::Document => self.documents.push(attachment),
        }
    }

    /// Returns the bucket for `kind`.
    #[must_use]
    pub fn of_kind(&self, kind: AttachmentKind) -> &[Attachment] {
        match kind {
            AttachmentKind::Image => &self.images,
            AttachmentKind::Video => &self.videos,
            AttachmentKind::Audio => &self.audio,
            AttachmentKind::Document => &self.documents,
        }
    }

    /// Total number of classified attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.videos.len() + self.images.len() + self.documents.len() + self.audio.len()
    }

    /// Returns true if nothing was classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the images should be rendered as a packed album.
    #[must_use]
    pub fn has_album(&self) -> bool {
        self.images.len() >= 2
    }
}
