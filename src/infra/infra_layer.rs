// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "kv/kv_store.rs"]
pub mod kv;

#[path = "moderation/mod.rs"]
pub mod moderation;
