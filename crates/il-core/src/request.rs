//! Immutable load request values.
//! 不可变的加载请求值。

use crate::ids::RequestId;
use crate::source::ImageSource;

/// Requested output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Opaque placeholder resource id, resolved by the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderId(pub u32);

/// Per-request behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Decode no smaller than this size; `None` decodes at full size.
    pub target_size: Option<TargetSize>,
    /// Consult and populate the in-memory tier.
    pub use_memory_cache: bool,
    /// Revalidate remote images with a HEAD request and key caches by ETag.
    pub with_etag: bool,
    /// Load even if the target reports the source as already shown.
    pub force: bool,
    /// Shown while loading and restored on failure.
    pub placeholder: Option<PlaceholderId>,
}

/// One load: a source plus its options.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Unique per request.
    pub id: RequestId,
    /// `None` only applies the placeholder.
    pub source: Option<ImageSource>,
    pub options: LoadOptions,
}

impl LoadRequest {
    pub fn new(source: Option<ImageSource>, options: LoadOptions) -> Self {
        Self {
            id: RequestId::new(),
            source,
            options,
        }
    }
}
