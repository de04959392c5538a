// Drops cached comment listings for a post from the KV store.
//
// Listing pages are cached under `comments:{post_id}#{page}`; the `#` keeps
// `/blog/1` from matching `/blog/10`.

use crate::core::moderation::{CacheInvalidator, ModerationError};
use crate::infra::kv::KvStore;
use async_trait::async_trait;

/// Key prefix shared by every cached listing of `post_id`.
pub fn listing_prefix(post_id: &str) -> String {
    format!("comments:{}#", post_id)
}

/// Cache key of one listing page of `post_id`.
#[allow(dead_code)]
pub fn listing_key(post_id: &str, page: &str) -> String {
    format!("{}{}", listing_prefix(post_id), page)
}

pub struct KvCacheInvalidator<K: KvStore> {
    kv: K,
}

impl<K: KvStore> KvCacheInvalidator<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }
}

#[async_trait]
impl<K: KvStore> CacheInvalidator for KvCacheInvalidator<K> {
    async fn invalidate(&self, post_id: &str) -> Result<(), ModerationError> {
        let keys = self
            .kv
            .list(&listing_prefix(post_id))
            .await
            .map_err(|e| ModerationError::CacheUnavailable(e.to_string()))?;

        for key in &keys {
            self.kv
                .delete(key)
                .await
                .map_err(|e| ModerationError::CacheUnavailable(e.to_string()))?;
        }

        tracing::debug!(post_id, dropped = keys.len(), "Invalidated comment cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::kv::InMemoryKvStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_invalidate_drops_only_that_post() {
        let kv = Arc::new(InMemoryKvStore::new());
        kv.put(&listing_key("/blog/1", "1"), "[]").await.unwrap();
        kv.put(&listing_key("/blog/1", "2"), "[]").await.unwrap();
        kv.put(&listing_key("/blog/10", "1"), "[]").await.unwrap();
        kv.put("config", "{}").await.unwrap();

        let invalidator = KvCacheInvalidator::new(Arc::clone(&kv));
        invalidator.invalidate("/blog/1").await.unwrap();

        assert!(kv.list(&listing_prefix("/blog/1")).await.unwrap().is_empty());
        assert_eq!(kv.list(&listing_prefix("/blog/10")).await.unwrap().len(), 1);
        assert!(kv.get("config").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalidate_without_cache_is_ok() {
        let invalidator = KvCacheInvalidator::new(InMemoryKvStore::new());
        invalidator.invalidate("/never/cached").await.unwrap();
    }
}
