//! In-memory bitmap cache bounded by decoded byte footprint.
//! 按解码字节占用限制容量的内存位图缓存。

use async_trait::async_trait;
use il_core::ports::BitmapCachePort;
use il_core::{Bitmap, CacheKey};
use lru::LruCache;
use tokio::sync::Mutex;

use crate::memory_budget::memory_cache_capacity_kib;

/// LRU cache of decoded bitmaps. Capacity and sizes are in KiB.
/// 以 KiB 计量容量的 LRU 位图缓存。
pub struct MemoryCache {
    capacity_kib: u64,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: LruCache<CacheKey, CacheEntry>,
    size_kib: u64,
}

struct CacheEntry {
    bitmap: Bitmap,
    size_kib: u64,
}

impl MemoryCache {
    /// Create a cache holding at most `capacity_kib` KiB of decoded pixels.
    /// 创建容量为 `capacity_kib` KiB 的缓存。
    pub fn new(capacity_kib: u64) -> Self {
        Self {
            capacity_kib,
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                size_kib: 0,
            }),
        }
    }

    /// Cache sized to one eighth of `budget_kib`.
    pub fn with_budget(budget_kib: u64) -> Self {
        Self::new(memory_cache_capacity_kib(budget_kib))
    }

    pub fn capacity_kib(&self) -> u64 {
        self.capacity_kib
    }

    pub async fn size_kib(&self) -> u64 {
        self.inner.lock().await.size_kib
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Footprint of `bitmap` in KiB, rounded up, never below one.
pub fn footprint_kib(bitmap: &Bitmap) -> u64 {
    (bitmap.allocation_bytes() as u64).div_ceil(1024).max(1)
}

#[async_trait]
impl BitmapCachePort for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<Bitmap> {
        let mut inner = self.inner.lock().await;
        let released = inner.entries.get(key)?.bitmap.is_released();
        if released {
            inner.remove_entry(key);
            return None;
        }
        inner.entries.peek(key).map(|entry| entry.bitmap.clone())
    }

    /// Insert or replace, then evict least recently used entries until the
    /// cache fits. An entry larger than the whole capacity is not stored.
    async fn put(&self, key: &CacheKey, bitmap: Bitmap) {
        let size_kib = footprint_kib(&bitmap);
        let mut inner = self.inner.lock().await;

        inner.remove_entry(key);
        if size_kib > self.capacity_kib {
            tracing::debug!(
                cache_key = %key,
                size_kib,
                capacity_kib = self.capacity_kib,
                "Bitmap larger than memory cache, not cached"
            );
            return;
        }

        inner.entries.put(key.clone(), CacheEntry { bitmap, size_kib });
        inner.size_kib = inner.size_kib.saturating_add(size_kib);
        inner.evict_to(self.capacity_kib);
    }

    async fn remove(&self, key: &CacheKey) -> Option<Bitmap> {
        self.inner.lock().await.remove_entry(key)
    }

    async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.size_kib = 0;
    }
}

impl Inner {
    fn remove_entry(&mut self, key: &CacheKey) -> Option<Bitmap> {
        let entry = self.entries.pop(key)?;
        self.size_kib = self.size_kib.saturating_sub(entry.size_kib);
        Some(entry.bitmap)
    }

    fn evict_to(&mut self, capacity_kib: u64) {
        while self.size_kib > capacity_kib {
            let Some((evicted_key, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.size_kib = self.size_kib.saturating_sub(entry.size_kib);
            tracing::trace!(cache_key = %evicted_key, size_kib = entry.size_kib, "Evicted bitmap");
        }
    }
}
