use thiserror::Error;

use shared_models::error::BookingError;

#[derive(Error, Debug)]
pub enum HoldStoreError {
    #[error("Redis connection error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis pool error: {0}")]
    Pool(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<deadpool_redis::PoolError> for HoldStoreError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        HoldStoreError::Pool(err.to_string())
    }
}

impl From<HoldStoreError> for BookingError {
    fn from(err: HoldStoreError) -> Self {
        tracing::error!("Hold store failure: {}", err);
        BookingError::store_unavailable(err)
    }
}
