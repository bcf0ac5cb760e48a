use anyhow::{Context, Result};
use async_trait::async_trait;
use il_core::ports::KeyValueStorePort;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// JSON-file backed key-value store.
///
/// The whole map is loaded on first use and kept in memory. Every mutation
/// rewrites the file through a temp file and rename, and only updates the
/// in-memory map once the rename succeeded.
pub struct FileKeyValueStore {
    path: PathBuf,
    state: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileKeyValueStore {
    /// Creates a store persisted at `path`. Nothing is read until first use.
    ///
    /// # Examples
    ///
    /// ```
    /// let _store = il_infra::FileKeyValueStore::new("cache/image_cache_registry.json");
    /// ```
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create registry dir failed: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Read the file. Missing file is an empty map; an unreadable document is
    /// logged and treated as empty so a corrupt registry degrades to misses.
    async fn read_map(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read registry failed: {}", self.path.display()))
            }
        };

        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Registry file is corrupt, starting empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    /// Atomically replace the file with `map`.
    async fn atomic_write(&self, map: &BTreeMap<String, String>) -> Result<()> {
        self.ensure_parent_dir().await?;

        let content = serde_json::to_string_pretty(map).context("serialize registry failed")?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("write temp registry failed: {}", tmp_path.display()))?;

        fs::rename(&tmp_path, &self.path).await.with_context(|| {
            format!(
                "rename temp registry to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    async fn loaded<'a>(
        &self,
        state: &'a mut Option<BTreeMap<String, String>>,
    ) -> Result<&'a mut BTreeMap<String, String>> {
        if state.is_none() {
            *state = Some(self.read_map().await?);
        }
        Ok(state.get_or_insert_with(BTreeMap::new))
    }
}

#[async_trait]
impl KeyValueStorePort for FileKeyValueStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        let map = self.loaded(&mut state).await?;
        Ok(map.get(key).cloned())
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let map = self.loaded(&mut state).await?;

        let mut next = map.clone();
        next.insert(key.to_string(), value.to_string());
        self.atomic_write(&next).await?;

        *map = next;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut state = self.state.lock().await;
        let map = self.loaded(&mut state).await?;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let empty = BTreeMap::new();
        self.atomic_write(&empty).await?;
        *state = Some(empty);
        Ok(())
    }
}
