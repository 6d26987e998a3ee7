use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::error::HoldStoreError;
use crate::models::{Hold, HoldId, SlotKey};
use crate::services::store::HoldStore;

/// Single-process hold store. Expiry follows the tokio clock so paused-time
/// tests can advance past a TTL.
#[derive(Default)]
pub struct InMemoryHoldStore {
    entries: Mutex<HashMap<String, (Hold, Instant)>>,
}

impl InMemoryHoldStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(entry: Option<&(Hold, Instant)>, now: Instant) -> Option<Hold> {
        entry
            .filter(|(_, expires)| *expires > now)
            .map(|(hold, _)| hold.clone())
    }
}

#[async_trait]
impl HoldStore for InMemoryHoldStore {
    async fn create_if_absent(&self, key: &SlotKey, hold: &Hold, ttl_seconds: u64) -> Result<bool, HoldStoreError> {
        let now = Instant::now();
        let cache_key = key.cache_key();
        let mut entries = self.entries.lock().await;

        if Self::live(entries.get(&cache_key), now).is_some() {
            return Ok(false);
        }

        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(cache_key, (hold.clone(), now + Duration::from_secs(ttl_seconds)));
        Ok(true)
    }

    async fn get(&self, key: &SlotKey) -> Result<Option<Hold>, HoldStoreError> {
        let entries = self.entries.lock().await;
        Ok(Self::live(entries.get(&key.cache_key()), Instant::now()))
    }

    async fn get_many(&self, keys: &[SlotKey]) -> Result<Vec<Option<Hold>>, HoldStoreError> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .map(|key| Self::live(entries.get(&key.cache_key()), now))
            .collect())
    }

    async fn delete(&self, key: &SlotKey, hold_id: &HoldId) -> Result<bool, HoldStoreError> {
        let cache_key = key.cache_key();
        let mut entries = self.entries.lock().await;

        match Self::live(entries.get(&cache_key), Instant::now()) {
            Some(hold) if &hold.hold_id == hold_id => {
                entries.remove(&cache_key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
