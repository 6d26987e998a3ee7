use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ScheduleBlock, UpsertBlockRequest};
use crate::services::ScheduleService;

pub async fn list_blocks(
    State(service): State<Arc<ScheduleService>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<ScheduleBlock>>, AppError> {
    let blocks = service.list_blocks(provider_id).await?;
    Ok(Json(blocks))
}

pub async fn get_block(
    State(service): State<Arc<ScheduleService>>,
    Path((provider_id, block_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ScheduleBlock>, AppError> {
    let block = service.get_block(provider_id, block_id).await?;
    Ok(Json(block))
}

pub async fn save_block(
    State(service): State<Arc<ScheduleService>>,
    Path(provider_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpsertBlockRequest>,
) -> Result<(StatusCode, Json<ScheduleBlock>), AppError> {
    tracing::debug!("User {} saving schedule block for provider {}", user.id, provider_id);

    let block = service.save_block(request.into_block(provider_id)).await?;
    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn delete_block(
    State(service): State<Arc<ScheduleService>>,
    Path((provider_id, block_id)): Path<(Uuid, Uuid)>,
    Extension(user): Extension<User>,
) -> Result<StatusCode, AppError> {
    tracing::debug!("User {} deleting schedule block {}", user.id, block_id);

    service.delete_block(provider_id, block_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
