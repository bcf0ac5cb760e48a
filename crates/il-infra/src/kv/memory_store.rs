use anyhow::Result;
use async_trait::async_trait;
use il_core::ports::KeyValueStorePort;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// Non-persistent key-value store, for tests and ephemeral loaders.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    map: Mutex<BTreeMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStorePort for InMemoryKeyValueStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.lock().await.get(key).cloned())
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.map
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .map
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn clear(&self) -> Result<()> {
        self.map.lock().await.clear();
        Ok(())
    }
}
