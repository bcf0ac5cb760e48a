//! Disk cache registry: cache keys mapped to files in a private directory.
//! 磁盘缓存注册表：缓存键到私有目录中文件的映射。

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use il_core::ports::{DiskCachePort, KeyValueStorePort};
use il_core::CacheKey;
use tokio::fs;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Registry of cached image files.
///
/// Only file names are persisted; they are always resolved against the cache
/// directory, and names are random UUIDs never derived from the source.
pub struct DiskCacheRegistry {
    cache_dir: PathBuf,
    store: Arc<dyn KeyValueStorePort>,
}

impl DiskCacheRegistry {
    /// Create the registry and ensure the cache directory exists.
    /// 创建注册表并确保缓存目录存在。
    pub fn new(cache_dir: impl Into<PathBuf>, store: Arc<dyn KeyValueStorePort>) -> Result<Self> {
        let cache_dir = cache_dir.into();

        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir: {}", cache_dir.display()))?;

        let metadata = std::fs::metadata(&cache_dir).with_context(|| {
            format!("Failed to read cache dir metadata: {}", cache_dir.display())
        })?;
        if !metadata.is_dir() {
            return Err(anyhow::anyhow!(
                "Cache path is not a directory: {}",
                cache_dir.display()
            ));
        }

        #[cfg(unix)]
        {
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&cache_dir, perms).with_context(|| {
                format!(
                    "Failed to set cache dir permissions: {}",
                    cache_dir.display()
                )
            })?;
        }

        Ok(Self { cache_dir, store })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path for a stored file name, or `None` if the name does not denote a
    /// plain file directly inside the cache directory.
    fn path_for(&self, file_name: &str) -> Option<PathBuf> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(name)), None) => Some(self.cache_dir.join(name)),
            _ => None,
        }
    }
}

#[async_trait]
impl DiskCachePort for DiskCacheRegistry {
    /// Stale entries (file gone or name unusable) are misses, not errors.
    async fn resolve(&self, key: &CacheKey) -> Result<Option<PathBuf>> {
        let Some(file_name) = self
            .store
            .get_string(key.as_str())
            .await
            .with_context(|| format!("Failed to read registry entry for {key}"))?
        else {
            return Ok(None);
        };

        let Some(path) = self.path_for(&file_name) else {
            tracing::warn!(cache_key = %key, file_name = %file_name, "Ignoring invalid registry entry");
            return Ok(None);
        };

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(path)),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(cache_key = %key, path = %path.display(), "Registered cache file is gone");
                Ok(None)
            }
            Err(err) => Err(err)
                .with_context(|| format!("Failed to stat cache file: {}", path.display())),
        }
    }

    async fn register(&self, key: &CacheKey, file: &Path) -> Result<()> {
        if file.parent() != Some(self.cache_dir.as_path()) {
            return Err(anyhow::anyhow!(
                "File is outside the cache dir: {}",
                file.display()
            ));
        }
        let file_name = file
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Cache file has no usable name: {}", file.display()))?;

        self.store
            .put_string(key.as_str(), file_name)
            .await
            .with_context(|| format!("Failed to register cache file for {key}"))
    }

    async fn new_cache_file(&self) -> Result<PathBuf> {
        let path = self.cache_dir.join(uuid::Uuid::new_v4().to_string());

        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to create cache file: {}", path.display()))?;

        #[cfg(unix)]
        {
            let perms = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(&path, perms).await.with_context(|| {
                format!("Failed to set cache file permissions: {}", path.display())
            })?;
        }

        Ok(path)
    }

    async fn lookup_or_allocate(&self, key: &CacheKey) -> Result<PathBuf> {
        if let Some(path) = self.resolve(key).await? {
            return Ok(path);
        }
        let path = self.new_cache_file().await?;
        self.register(key, &path).await?;
        Ok(path)
    }

    /// Delete every referenced file, then empty the mapping. Missing files
    /// are skipped.
    async fn clear(&self) -> Result<usize> {
        let entries = self
            .store
            .entries()
            .await
            .context("Failed to list registry entries")?;

        let mut removed = 0;
        for (key, file_name) in entries {
            let Some(path) = self.path_for(&file_name) else {
                continue;
            };
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(
                        cache_key = %key,
                        path = %path.display(),
                        error = %err,
                        "Failed to delete cache file"
                    );
                }
            }
        }

        self.store
            .clear()
            .await
            .context("Failed to clear registry")?;

        tracing::info!(removed, cache_dir = %self.cache_dir.display(), "Disk cache cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKeyValueStore;
    use mockall::mock;
    use tempfile::TempDir;

    mock! {
        pub Store {}

        #[async_trait]
        impl KeyValueStorePort for Store {
            async fn get_string(&self, key: &str) -> anyhow::Result<Option<String>>;
            async fn put_string(&self, key: &str, value: &str) -> anyhow::Result<()>;
            async fn entries(&self) -> anyhow::Result<Vec<(String, String)>>;
            async fn clear(&self) -> anyhow::Result<()>;
        }
    }

    fn registry(temp: &TempDir) -> DiskCacheRegistry {
        DiskCacheRegistry::new(
            temp.path().join("images"),
            Arc::new(InMemoryKeyValueStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_resolve() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let key = CacheKey::from("https://example.com/a.png;");

        let file = registry.new_cache_file().await.unwrap();
        registry.register(&key, &file).await.unwrap();

        assert_eq!(registry.resolve(&key).await.unwrap(), Some(file));
    }

    #[tokio::test]
    async fn test_unknown_key_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        assert_eq!(
            registry.resolve(&CacheKey::from("missing")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_stale_entry_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let key = CacheKey::from("k");
        let file = registry.new_cache_file().await.unwrap();
        registry.register(&key, &file).await.unwrap();

        std::fs::remove_file(&file).unwrap();

        assert_eq!(registry.resolve(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_new_cache_files_are_unique_and_unregistered() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        let a = registry.new_cache_file().await.unwrap();
        let b = registry.new_cache_file().await.unwrap();

        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
        assert_eq!(a.parent(), Some(registry.cache_dir()));
        assert_eq!(registry.store.entries().await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_register_rejects_files_outside_cache_dir() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        let outside = temp.path().join("elsewhere.png");
        assert!(registry
            .register(&CacheKey::from("k"), &outside)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_lookup_or_allocate_reuses_entry() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let key = CacheKey::from("content://media/images/1");

        let first = registry.lookup_or_allocate(&key).await.unwrap();
        let second = registry.lookup_or_allocate(&key).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_clear_deletes_files_and_entries() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);
        let a = registry.lookup_or_allocate(&CacheKey::from("a")).await.unwrap();
        let b = registry.lookup_or_allocate(&CacheKey::from("b")).await.unwrap();
        std::fs::remove_file(&b).unwrap();

        let removed = registry.clear().await.unwrap();

        assert_eq!(removed, 1);
        assert!(!a.exists());
        assert_eq!(registry.resolve(&CacheKey::from("a")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_path_traversal_entry_is_ignored() {
        let temp = TempDir::new().unwrap();
        let mut store = MockStore::new();
        store
            .expect_get_string()
            .returning(|_| Ok(Some("../secret".to_string())));
        let registry = DiskCacheRegistry::new(temp.path().join("images"), Arc::new(store)).unwrap();

        assert_eq!(registry.resolve(&CacheKey::from("k")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_from_register() {
        let temp = TempDir::new().unwrap();
        let mut store = MockStore::new();
        store
            .expect_put_string()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        let registry = DiskCacheRegistry::new(temp.path().join("images"), Arc::new(store)).unwrap();

        let file = registry.new_cache_file().await.unwrap();
        let err = registry
            .register(&CacheKey::from("k"), &file)
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("disk full"));
    }

    #[tokio::test]
    async fn test_clear_empties_store_after_deleting() {
        let temp = TempDir::new().unwrap();
        let mut store = MockStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_entries()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![("k".to_string(), "gone".to_string())]));
        store
            .expect_clear()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        let registry = DiskCacheRegistry::new(temp.path().join("images"), Arc::new(store)).unwrap();

        assert_eq!(registry.clear().await.unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_dir_is_private() {
        let temp = TempDir::new().unwrap();
        let registry = registry(&temp);

        let mode = std::fs::metadata(registry.cache_dir())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o700);
    }
}
