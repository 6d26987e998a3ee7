use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::BookingError;

use crate::models::{Hold, HoldId, HoldRequest, SlotKey};
use crate::services::store::HoldStore;

/// Grants, looks up and releases slot holds.
///
/// Exclusion comes entirely from the store's atomic create-if-absent; the
/// manager keeps no state of its own and never retries.
#[derive(Clone)]
pub struct HoldManager {
    store: Arc<dyn HoldStore>,
    ttl_seconds: u64,
}

impl HoldManager {
    pub fn new(store: Arc<dyn HoldStore>, ttl_seconds: u64) -> Self {
        Self { store, ttl_seconds }
    }

    pub fn from_config(store: Arc<dyn HoldStore>, config: &AppConfig) -> Self {
        Self::new(store, config.hold_ttl_seconds)
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    #[instrument(skip(self, request), fields(provider_id = %request.provider_id, start_ts = %request.start_ts))]
    pub async fn create_hold(&self, request: &HoldRequest, requester_id: Uuid) -> Result<Hold, BookingError> {
        let key = request.slot_key();
        let hold = Hold {
            hold_id: HoldId::mint(&key),
            provider_id: request.provider_id,
            location_id: request.location_id,
            start_ts: request.start_ts,
            end_ts: request.end_ts,
            requester_id,
            created_at: Utc::now(),
            ttl_seconds: self.ttl_seconds,
        };

        if !self.store.create_if_absent(&key, &hold, self.ttl_seconds).await? {
            warn!("Slot {} already held", key.cache_key());
            return Err(BookingError::SlotUnavailable);
        }

        info!("Hold granted on {} until {}", key.cache_key(), hold.expires_at());
        Ok(hold)
    }

    /// The live hold behind `hold_id`, if any. Unknown, expired, released and
    /// malformed tokens all read as `None`.
    pub async fn get_hold(&self, hold_id: &HoldId) -> Result<Option<Hold>, BookingError> {
        let Some(key) = hold_id.slot_key() else {
            debug!("Rejecting malformed hold token");
            return Ok(None);
        };

        let hold = self.store.get(&key).await?;
        Ok(hold.filter(|h| &h.hold_id == hold_id))
    }

    #[instrument(skip(self, hold_id))]
    pub async fn release_hold(&self, hold_id: &HoldId) -> Result<bool, BookingError> {
        let Some(key) = hold_id.slot_key() else {
            return Ok(false);
        };

        let released = self.store.delete(&key, hold_id).await?;
        if released {
            info!("Hold on {} released", key.cache_key());
        }
        Ok(released)
    }

    /// Which of `keys` currently carry a live hold, in order.
    pub async fn claimed(&self, keys: &[SlotKey]) -> Result<Vec<bool>, BookingError> {
        let holds = self.store.get_many(keys).await?;
        Ok(holds.iter().map(Option::is_some).collect())
    }
}
