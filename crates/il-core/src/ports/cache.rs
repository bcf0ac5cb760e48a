use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::bitmap::Bitmap;
use crate::cache_key::CacheKey;

/// In-memory tier of decoded bitmaps.
#[async_trait]
pub trait BitmapCachePort: Send + Sync {
    /// Released bitmaps are never returned.
    async fn get(&self, key: &CacheKey) -> Option<Bitmap>;

    async fn put(&self, key: &CacheKey, bitmap: Bitmap);

    async fn remove(&self, key: &CacheKey) -> Option<Bitmap>;

    async fn clear(&self);
}

/// Disk tier: maps cache keys to files in a private cache directory.
#[async_trait]
pub trait DiskCachePort: Send + Sync {
    /// Path of the file registered for `key`, if it still exists.
    async fn resolve(&self, key: &CacheKey) -> Result<Option<PathBuf>>;

    /// Record `file` (inside the cache directory) as the entry for `key`.
    async fn register(&self, key: &CacheKey, file: &Path) -> Result<()>;

    /// A fresh, unregistered file path in the cache directory.
    async fn new_cache_file(&self) -> Result<PathBuf>;

    /// Registered path for `key`, or a new file registered under `key`.
    async fn lookup_or_allocate(&self, key: &CacheKey) -> Result<PathBuf>;

    /// Delete every registered file and empty the registry. Returns the number
    /// of files removed.
    async fn clear(&self) -> Result<usize>;
}
