use async_trait::async_trait;

use crate::error::HoldStoreError;
use crate::models::{Hold, HoldId, SlotKey};

/// Cache layer that owns live holds.
///
/// Implementations must make `create_if_absent` atomic with the TTL applied in
/// the same operation, and `delete` a compare-and-delete on the hold id.
#[async_trait]
pub trait HoldStore: Send + Sync {
    /// `Ok(false)` when a live hold already exists for the key.
    async fn create_if_absent(&self, key: &SlotKey, hold: &Hold, ttl_seconds: u64) -> Result<bool, HoldStoreError>;

    async fn get(&self, key: &SlotKey) -> Result<Option<Hold>, HoldStoreError>;

    /// One batched read, results in key order.
    async fn get_many(&self, keys: &[SlotKey]) -> Result<Vec<Option<Hold>>, HoldStoreError>;

    /// Removes the key only while it still holds `hold_id`.
    async fn delete(&self, key: &SlotKey, hold_id: &HoldId) -> Result<bool, HoldStoreError>;
}
