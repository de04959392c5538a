// In-memory KV store. Used by tests and when no database path is configured.

use super::{KvError, KvStore};
use async_trait::async_trait;
use dashmap::DashMap;

/// DashMap-backed store, safe to share across concurrent requests.
#[allow(dead_code)]
pub struct InMemoryKvStore {
    data: DashMap<String, String>,
}

#[allow(dead_code)]
impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, KvError> {
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        self.data.remove(key);
        Ok(())
    }
}
