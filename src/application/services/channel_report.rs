//! Per-channel summary: dated grid, media counts and message albums.

use std::collections::HashMap;

use serde::Serialize;

use super::gallery_view::{GalleryPage, GalleryView};
use crate::domain::entities::{
    AlbumLayout, Attachment, ChannelKey, ClassifiedAttachments, PhotoSize,
};
use crate::domain::services::{AlbumConstraints, AlbumLayoutEngine, AttachmentClassifier, MessageOrigin};

/// Number of attachments per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct KindCounts {
    pub images: usize,
    pub videos: usize,
    pub audio: usize,
    pub documents: usize,
}

impl From<&ClassifiedAttachments> for KindCounts {
    fn from(classified: &ClassifiedAttachments) -> Self {
        Self {
            images: classified.images.len(),
            videos: classified.videos.len(),
            audio: classified.audio.len(),
            documents: classified.documents.len(),
        }
    }
}

/// Packed layout of a message carrying two or more images.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAlbum {
    /// Message the images belong to.
    pub message_id: String,
    /// Images in layout order.
    pub images: Vec<Attachment>,
    /// Cell per image.
    pub layout: AlbumLayout,
}

/// Everything printed for one channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelReport {
    /// Channel the report covers.
    pub channel: ChannelKey,
    /// Sectioned grid.
    pub page: GalleryPage,
    /// Attachments per kind.
    pub counts: KindCounts,
    /// Albums, in order of their newest image.
    pub albums: Vec<MessageAlbum>,
    /// Whether older pages remain on the server.
    pub has_more_before: bool,
}

/// Builds channel reports with a fixed grid and album configuration.
pub struct ChannelReporter {
    view: GalleryView,
    albums: AlbumLayoutEngine,
    container_width: f64,
}

impl ChannelReporter {
    /// Creates a reporter.
    #[must_use]
    pub fn new(chunk_size: usize, constraints: AlbumConstraints, container_width: f64) -> Self {
        Self {
            view: GalleryView::new(chunk_size),
            albums: AlbumLayoutEngine::new(constraints),
            container_width,
        }
    }

    /// Summarizes `items` (newest first) of `channel`.
    #[must_use]
    pub fn report(
        &self,
        channel: &ChannelKey,
        items: &[Attachment],
        has_more_before: bool,
    ) -> ChannelReport {
        let page = self.view.build(&channel.channel_id, items);
        let counts = KindCounts::from(&AttachmentClassifier::classify(items));

        ChannelReport {
            channel: channel.clone(),
            page: (*page).clone(),
            counts,
            albums: self.message_albums(items),
            has_more_before,
        }
    }

    fn message_albums(&self, items: &[Attachment]) -> Vec<MessageAlbum> {
        let mut order: Vec<&str> = Vec::new();
        let mut by_message: HashMap<&str, Vec<Attachment>> = HashMap::new();
        for item in items {
            let Some(message_id) = item.message_id() else {
                continue;
            };
            by_message
                .entry(message_id)
                .or_insert_with(|| {
                    order.push(message_id);
                    Vec::new()
                })
                .push(item.clone());
        }

        order
            .into_iter()
            .filter_map(|message_id| {
                let mut attachments = by_message.remove(message_id)?;
                // Items arrive newest first; albums keep upload order.
                attachments.reverse();
                let first = attachments.first()?;
                let origin = MessageOrigin {
                    sender_id: first.sender_id(),
                    create_time: first.create_time(),
                };
                let classified = AttachmentClassifier::classify_message(&attachments, origin);
                if !classified.has_album() {
                    return None;
                }
                let photos: Vec<PhotoSize> = classified.images.iter().map(PhotoSize::from).collect();
                Some(MessageAlbum {
                    message_id: message_id.to_string(),
                    layout: self.albums.calculate(&photos, self.container_width),
                    images: classified.images,
                })
            })
            .collect()
    }
}
