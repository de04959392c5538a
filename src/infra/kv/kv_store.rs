// Key-value storage used for moderation settings and cached comment listings.
//
// Mirrors the get/put/list/delete surface of the hosted KV service the widget
// runs against, so the SQLite and in-memory stores can stand in for it.

use async_trait::async_trait;
use thiserror::Error;

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryKvStore;
pub use sqlite_store::SqliteKvStore;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn put(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Keys starting with `prefix`, in ascending order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, KvError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}

// Lets one store back several adapters (config and cache share it in main).
#[async_trait]
impl<K: KvStore + ?Sized> KvStore for std::sync::Arc<K> {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).put(key, value).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        (**self).list(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        (**self).delete(key).await
    }
}
