use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use shared_models::error::BookingError;

use crate::models::ScheduleBlock;
use crate::services::validation::{check_work_overlap, validate_block};

/// Durable home of schedule blocks.
///
/// `save_block` validates the block and rejects a work block that would
/// overlap another work block of the same provider.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn blocks_for_provider(&self, provider_id: Uuid) -> Result<Vec<ScheduleBlock>, BookingError>;

    async fn get_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<Option<ScheduleBlock>, BookingError>;

    /// Insert or replace; `updated_at` is stamped by the store.
    async fn save_block(&self, block: ScheduleBlock) -> Result<ScheduleBlock, BookingError>;

    async fn delete_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<bool, BookingError>;
}

#[derive(Default)]
pub struct InMemoryScheduleStore {
    blocks: Mutex<HashMap<Uuid, ScheduleBlock>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn blocks_for_provider(&self, provider_id: Uuid) -> Result<Vec<ScheduleBlock>, BookingError> {
        let blocks = self.blocks.lock().await;
        let mut result: Vec<ScheduleBlock> = blocks
            .values()
            .filter(|b| b.provider_id == provider_id)
            .cloned()
            .collect();
        result.sort_by_key(|b| b.id);
        Ok(result)
    }

    async fn get_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<Option<ScheduleBlock>, BookingError> {
        let blocks = self.blocks.lock().await;
        Ok(blocks.get(&block_id).filter(|b| b.provider_id == provider_id).cloned())
    }

    async fn save_block(&self, mut block: ScheduleBlock) -> Result<ScheduleBlock, BookingError> {
        validate_block(&block)?;

        // Check and write under one lock so two writers cannot both pass
        let mut blocks = self.blocks.lock().await;

        if let Some(existing) = blocks.get(&block.id) {
            if existing.provider_id != block.provider_id {
                return Err(BookingError::InvalidSchedule(
                    "Block belongs to another provider".to_string(),
                ));
            }
        }

        let siblings: Vec<ScheduleBlock> = blocks
            .values()
            .filter(|b| b.provider_id == block.provider_id)
            .cloned()
            .collect();
        check_work_overlap(&block, &siblings)?;

        block.updated_at = Utc::now();
        blocks.insert(block.id, block.clone());
        debug!("Saved schedule block {} for provider {}", block.id, block.provider_id);

        Ok(block)
    }

    async fn delete_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<bool, BookingError> {
        let mut blocks = self.blocks.lock().await;
        match blocks.get(&block_id) {
            Some(block) if block.provider_id == provider_id => {
                blocks.remove(&block_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
