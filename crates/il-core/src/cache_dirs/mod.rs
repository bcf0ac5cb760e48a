use std::path::PathBuf;

/// Resolved base directories for the loader (pure facts, no existence check).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirs {
    /// Private directory holding downloaded and copied image files.
    pub cache_root: PathBuf,
    /// Directory for durable state such as logs.
    pub data_root: PathBuf,
}
