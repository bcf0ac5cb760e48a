use std::fmt::{Display, Formatter};
use std::path::Path;

use url::Url;

use crate::source::ContentHandle;

/// Join key shared by the memory cache, the disk cache registry and remote
/// revalidation.
///
/// Remote keys embed the ETag (`"{url};{etag}"`), so a changed ETag maps to a
/// fresh entry instead of evicting the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_remote(url: &Url, etag: Option<&str>) -> Self {
        Self(format!("{};{}", url, etag.unwrap_or_default()))
    }

    /// Keyed by absolute path.
    pub fn for_file(absolute_path: &Path) -> Self {
        Self(absolute_path.to_string_lossy().into_owned())
    }

    pub fn for_content(handle: &ContentHandle) -> Self {
        Self(handle.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
