// Moderation infra layer.
// - `http_history_fetcher.rs` reads comment history from the data API.
// - `kv_config_store.rs` persists moderation settings in the KV store.
// - `kv_cache_invalidator.rs` drops cached comment listings from the KV store.

#[path = "http_history_fetcher.rs"]
pub mod http_history_fetcher;

#[path = "kv_config_store.rs"]
pub mod kv_config_store;

#[path = "kv_cache_invalidator.rs"]
pub mod kv_cache_invalidator;

pub use http_history_fetcher::HttpHistoryFetcher;
pub use kv_cache_invalidator::KvCacheInvalidator;
pub use kv_config_store::KvConfigStore;
