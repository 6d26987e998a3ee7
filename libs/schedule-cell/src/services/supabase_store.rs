use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use tracing::{debug, error};
use uuid::Uuid;

use shared_database::supabase::{SupabaseClient, SupabaseError};
use shared_models::error::BookingError;

use crate::models::ScheduleBlock;
use crate::services::store::ScheduleStore;
use crate::services::validation::{check_work_overlap, validate_block};

const TABLE_PATH: &str = "/rest/v1/schedule_blocks";

/// Schedule blocks in the `schedule_blocks` table, `timing` kept as jsonb.
pub struct SupabaseScheduleStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseScheduleStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

fn map_error(err: SupabaseError) -> BookingError {
    match err {
        SupabaseError::Constraint { message, .. } => BookingError::InvalidSchedule(message),
        other => {
            error!("Schedule store request failed: {}", other);
            BookingError::store_unavailable(other)
        }
    }
}

#[async_trait]
impl ScheduleStore for SupabaseScheduleStore {
    async fn blocks_for_provider(&self, provider_id: Uuid) -> Result<Vec<ScheduleBlock>, BookingError> {
        let path = format!("{}?provider_id=eq.{}&order=id.asc", TABLE_PATH, provider_id);

        let blocks: Vec<ScheduleBlock> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(map_error)?;

        debug!("Loaded {} schedule blocks for provider {}", blocks.len(), provider_id);
        Ok(blocks)
    }

    async fn get_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<Option<ScheduleBlock>, BookingError> {
        let path = format!("{}?id=eq.{}&provider_id=eq.{}", TABLE_PATH, block_id, provider_id);

        let blocks: Vec<ScheduleBlock> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(map_error)?;

        Ok(blocks.into_iter().next())
    }

    async fn save_block(&self, mut block: ScheduleBlock) -> Result<ScheduleBlock, BookingError> {
        validate_block(&block)?;

        let siblings = self.blocks_for_provider(block.provider_id).await?;
        check_work_overlap(&block, &siblings)?;

        block.updated_at = Utc::now();
        let body = serde_json::to_value(&block).map_err(BookingError::store_unavailable)?;
        let path = format!("{}?on_conflict=id", TABLE_PATH);

        let saved: Vec<ScheduleBlock> = self
            .supabase
            .request(
                Method::POST,
                &path,
                Some(body),
                Some("resolution=merge-duplicates,return=representation"),
            )
            .await
            .map_err(map_error)?;

        saved
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::store_unavailable("schedule block write returned no row"))
    }

    async fn delete_block(&self, provider_id: Uuid, block_id: Uuid) -> Result<bool, BookingError> {
        let path = format!("{}?id=eq.{}&provider_id=eq.{}", TABLE_PATH, block_id, provider_id);

        let deleted: Vec<ScheduleBlock> = self
            .supabase
            .request(Method::DELETE, &path, None, Some("return=representation"))
            .await
            .map_err(map_error)?;

        Ok(!deleted.is_empty())
    }
}
