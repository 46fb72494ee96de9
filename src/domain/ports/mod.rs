mod attachment_source_port;
mod preload_cache_port;

pub use attachment_source_port::{AttachmentSourcePort, FetchRequest, FetchResponse};
pub use preload_cache_port::PreloadCachePort;
