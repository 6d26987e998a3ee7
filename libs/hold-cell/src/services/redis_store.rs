use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::error::HoldStoreError;
use crate::models::{Hold, HoldId, SlotKey};
use crate::services::store::HoldStore;

// Deletes KEYS[1] only if its JSON value still carries hold_id == ARGV[1]
const COMPARE_AND_DELETE: &str = r#"
local value = redis.call('GET', KEYS[1])
if not value then
    return 0
end
local ok, hold = pcall(cjson.decode, value)
if ok and hold['hold_id'] == ARGV[1] then
    return redis.call('DEL', KEYS[1])
end
return 0
"#;

pub struct RedisHoldStore {
    pool: Pool,
}

impl RedisHoldStore {
    pub async fn new(config: &AppConfig) -> Result<Self, HoldStoreError> {
        let redis_url = config
            .redis_url
            .clone()
            .unwrap_or_else(|| "redis://localhost:6379".to_string());
        Self::from_url(&redis_url).await
    }

    pub async fn from_url(redis_url: &str) -> Result<Self, HoldStoreError> {
        let pool = Config::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| HoldStoreError::Pool(format!("Pool creation error: {}", e)))?;

        // Test connection
        let mut conn = pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis hold store initialized");

        Ok(Self { pool })
    }

    async fn get_connection(&self) -> Result<Connection, HoldStoreError> {
        Ok(self.pool.get().await?)
    }

    fn decode(raw: Option<String>) -> Result<Option<Hold>, HoldStoreError> {
        raw.map(|value| serde_json::from_str(&value))
            .transpose()
            .map_err(HoldStoreError::from)
    }
}

#[async_trait]
impl HoldStore for RedisHoldStore {
    async fn create_if_absent(&self, key: &SlotKey, hold: &Hold, ttl_seconds: u64) -> Result<bool, HoldStoreError> {
        let mut conn = self.get_connection().await?;
        let value = serde_json::to_string(hold)?;

        let reply: Option<String> = redis::cmd("SET")
            .arg(key.cache_key())
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;

        debug!("SET NX {} -> {:?}", key.cache_key(), reply);
        Ok(reply.is_some())
    }

    async fn get(&self, key: &SlotKey) -> Result<Option<Hold>, HoldStoreError> {
        let mut conn = self.get_connection().await?;
        let raw: Option<String> = conn.get(key.cache_key()).await?;
        Self::decode(raw)
    }

    async fn get_many(&self, keys: &[SlotKey]) -> Result<Vec<Option<Hold>>, HoldStoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_connection().await?;
        let cache_keys: Vec<String> = keys.iter().map(SlotKey::cache_key).collect();

        let raw: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&cache_keys)
            .query_async(&mut conn)
            .await?;
        debug!("MGET {} hold keys", cache_keys.len());

        raw.into_iter().map(Self::decode).collect()
    }

    async fn delete(&self, key: &SlotKey, hold_id: &HoldId) -> Result<bool, HoldStoreError> {
        let mut conn = self.get_connection().await?;

        let removed: i64 = redis::Script::new(COMPARE_AND_DELETE)
            .key(key.cache_key())
            .arg(hold_id.as_str())
            .invoke_async(&mut conn)
            .await?;

        Ok(removed > 0)
    }
}
