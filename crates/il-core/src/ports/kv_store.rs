use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable string-to-string store backing the disk cache registry.
///
/// Writes are transactional: a `put_string` or `clear` either lands completely
/// or not at all.
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    async fn put_string(&self, key: &str, value: &str) -> Result<()>;

    async fn entries(&self) -> Result<Vec<(String, String)>>;

    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl<T: KeyValueStorePort + ?Sized> KeyValueStorePort for Arc<T> {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        (**self).get_string(key).await
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<()> {
        (**self).put_string(key, value).await
    }

    async fn entries(&self) -> Result<Vec<(String, String)>> {
        (**self).entries().await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
}
