use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use shared_utils::extractor::identity_middleware;

use crate::handlers;
use crate::services::ScheduleService;

pub fn schedule_routes(service: Arc<ScheduleService>) -> Router {
    Router::new()
        .route(
            "/providers/{provider_id}/schedule-blocks",
            get(handlers::list_blocks).post(handlers::save_block),
        )
        .route(
            "/providers/{provider_id}/schedule-blocks/{block_id}",
            get(handlers::get_block).delete(handlers::delete_block),
        )
        .layer(middleware::from_fn(identity_middleware))
        .with_state(service)
}
