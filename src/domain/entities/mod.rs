//! Domain entity definitions.

mod album;
mod attachment;
mod media_kind;
mod pagination;
mod section;

pub use album::{AlbumItem, AlbumLayout, ContainerStyle, Dimensions, PhotoSize, RectPart};
pub use attachment::{Attachment, AttachmentKey, RawAttachment, normalize_all};
pub use media_kind::{AttachmentKind, ClassifiedAttachments};
pub use pagination::{ChannelKey, FetchDirection, PaginationState};
pub use section::{DateSection, Row};
