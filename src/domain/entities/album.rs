use serde::{Deserialize, Serialize};

use super::Attachment;

bitflags::bitflags! {
    /// Edges of the packed album rectangle a photo touches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct RectPart: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;
    }
}

impl RectPart {
    /// Returns true if the photo occupies the top-left corner.
    #[must_use]
    pub const fn is_top_left(self) -> bool {
        self.contains(Self::TOP.union(Self::LEFT))
    }

    /// Returns true if the photo occupies the bottom-right corner,
    /// where a bubble tail attaches.
    #[must_use]
    pub const fn is_bottom_right(self) -> bool {
        self.contains(Self::BOTTOM.union(Self::RIGHT))
    }
}

/// Source size of one photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotoSize {
    /// Original width in pixels.
    pub width: f64,
    /// Original height in pixels.
    pub height: f64,
}

impl PhotoSize {
    /// Creates a size from pixel dimensions.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width over height. Unknown or degenerate sizes count as square.
    #[must_use]
    pub fn aspect_ratio(self) -> f64 {
        if self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
        {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl From<&Attachment> for PhotoSize {
    fn from(attachment: &Attachment) -> Self {
        match (attachment.width(), attachment.height()) {
            (Some(w), Some(h)) => Self::new(f64::from(w), f64::from(h)),
            _ => Self::new(1.0, 1.0),
        }
    }
}

/// Position and size of one packed photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Dimensions {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Set when the cell was clamped to the minimum size.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_small: bool,
}

impl Dimensions {
    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Returns true if the interiors of the two rects intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Self, epsilon: f64) -> bool {
        self.x + epsilon < other.right()
            && other.x + epsilon < self.right()
            && self.y + epsilon < other.bottom()
            && other.y + epsilon < self.bottom()
    }
}

/// Packed cell for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlbumItem {
    /// Rect inside the container.
    pub dimensions: Dimensions,
    /// Container edges touched by the rect.
    pub sides: RectPart,
}

/// Outer size of the packed album.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ContainerStyle {
    pub width: f64,
    pub height: f64,
}

/// Packed album, index-aligned with the input photos.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumLayout {
    /// Outer container size.
    pub container_style: ContainerStyle,
    /// One cell per input photo, in input order.
    pub layout: Vec<AlbumItem>,
}
