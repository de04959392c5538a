// Moderation settings persisted as JSON under a single KV key.

use crate::core::moderation::{ConfigStore, ModerationError, ModerationSettings};
use crate::infra::kv::{KvError, KvStore};
use async_trait::async_trait;

pub const CONFIG_KEY: &str = "config";

pub struct KvConfigStore<K: KvStore> {
    kv: K,
}

impl<K: KvStore> KvConfigStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }
}

fn unavailable(e: KvError) -> ModerationError {
    ModerationError::ConfigUnavailable(e.to_string())
}

#[async_trait]
impl<K: KvStore> ConfigStore for KvConfigStore<K> {
    async fn load_settings(&self) -> Result<ModerationSettings, ModerationError> {
        let Some(text) = self.kv.get(CONFIG_KEY).await.map_err(unavailable)? else {
            return Ok(ModerationSettings::default());
        };

        serde_json::from_str(&text).map_err(|e| ModerationError::InvalidConfig(e.to_string()))
    }

    async fn save_settings(&self, settings: &ModerationSettings) -> Result<(), ModerationError> {
        let text = serde_json::to_string(settings)
            .map_err(|e| unavailable(KvError::Serialization(e.to_string())))?;
        self.kv.put(CONFIG_KEY, &text).await.map_err(unavailable)
    }
}
