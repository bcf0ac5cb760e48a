use std::io::Read;

use crate::source::ContentHandle;

/// Opens platform content handles as byte streams.
pub trait ContentResolverPort: Send + Sync {
    /// `Ok(None)` when the handle resolves to no content.
    fn open(&self, handle: &ContentHandle) -> anyhow::Result<Option<Box<dyn Read + Send>>>;
}
