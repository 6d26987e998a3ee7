use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_HOLD_TTL_SECONDS: u64 = 120;
pub const DEFAULT_MAX_HORIZON_DAYS: u32 = 90;
pub const DEFAULT_SERVER_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub redis_url: Option<String>,
    pub hold_ttl_seconds: u64,
    pub max_horizon_days: u32,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            redis_url: None,
            hold_ttl_seconds: DEFAULT_HOLD_TTL_SECONDS,
            max_horizon_days: DEFAULT_MAX_HORIZON_DAYS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, durable stores will run in memory");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            hold_ttl_seconds: parse_or_default("HOLD_TTL_SECONDS", DEFAULT_HOLD_TTL_SECONDS),
            max_horizon_days: parse_or_default("AVAILABILITY_MAX_HORIZON_DAYS", DEFAULT_MAX_HORIZON_DAYS),
            server_port: parse_or_default("SERVER_PORT", DEFAULT_SERVER_PORT),
        };

        if config.redis_url.is_none() {
            warn!("REDIS_URL not set, holds will be kept in process memory");
        }

        if config.hold_ttl_seconds == 0 {
            warn!("HOLD_TTL_SECONDS must be positive, using default");
            return Self { hold_ttl_seconds: DEFAULT_HOLD_TTL_SECONDS, ..config };
        }

        config
    }

    /// Durable rows go to PostgREST only when both URL and key are present.
    pub fn is_database_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_cache_configured(&self) -> bool {
        self.redis_url.is_some()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
