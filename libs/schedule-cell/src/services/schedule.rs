use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use shared_models::error::BookingError;

use crate::models::{ConcreteBlock, ScheduleBlock, TimeWindow};
use crate::services::materialize::ExpansionCache;
use crate::services::slots::SlotPlan;
use crate::services::store::ScheduleStore;

/// Read and write side of provider schedules.
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    cache: ExpansionCache,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self {
            store,
            cache: ExpansionCache::default(),
        }
    }

    pub fn with_cache(store: Arc<dyn ScheduleStore>, cache: ExpansionCache) -> Self {
        Self { store, cache }
    }

    /// Concrete blocks of a provider at one location over `window`.
    pub async fn concrete_blocks(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        window: TimeWindow,
    ) -> Result<Vec<ConcreteBlock>, BookingError> {
        let blocks = self.store.blocks_for_provider(provider_id).await?;

        let mut concrete = Vec::new();
        for block in blocks.iter().filter(|b| b.location_id == location_id) {
            concrete.extend(self.cache.expand(block, window).await);
        }

        debug!(
            "Materialized {} concrete blocks for provider {} at {}",
            concrete.len(),
            provider_id,
            location_id
        );
        Ok(concrete)
    }

    /// Slot plan for the window, net of the given busy intervals.
    pub async fn slot_plan(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        window: TimeWindow,
        busy: Vec<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<SlotPlan, BookingError> {
        let blocks = self.concrete_blocks(provider_id, location_id, window).await?;
        Ok(SlotPlan::new(provider_id, location_id, window, &blocks, busy))
    }

    /// Whether the schedule produces exactly `[start_ts, end_ts)` as a slot.
    pub async fn produces_slot(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        start_ts: DateTime<Utc>,
        end_ts: DateTime<Utc>,
    ) -> Result<bool, BookingError> {
        let plan = self
            .slot_plan(provider_id, location_id, TimeWindow::day_of(start_ts), Vec::new())
            .await?;
        Ok(plan.contains(start_ts, end_ts))
    }

    pub async fn list_blocks(&self, provider_id: Uuid) -> Result<Vec<ScheduleBlock>, BookingError> {
        self.store.blocks_for_provider(provider_id).await
    }

    pub async fn get_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<ScheduleBlock, BookingError> {
        self.store
            .get_block(provider_id, block_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Schedule block {}", block_id)))
    }

    #[instrument(skip(self, block), fields(block_id = %block.id, provider_id = %block.provider_id))]
    pub async fn save_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock, BookingError> {
        let saved = self.store.save_block(block).await?;
        info!("Schedule block {} saved ({:?})", saved.id, saved.kind);
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn delete_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<(), BookingError> {
        if !self.store.delete_block(provider_id, block_id).await? {
            return Err(BookingError::NotFound(format!("Schedule block {}", block_id)));
        }
        info!("Schedule block {} deleted", block_id);
        Ok(())
    }
}
