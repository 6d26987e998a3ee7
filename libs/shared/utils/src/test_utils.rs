use axum::http::request::Builder;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

use crate::extractor::{USER_ID_HEADER, USER_ROLE_HEADER};

pub struct TestConfig {
    pub hold_ttl_seconds: u64,
    pub max_horizon_days: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            hold_ttl_seconds: 120,
            max_horizon_days: 90,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            hold_ttl_seconds: self.hold_ttl_seconds,
            max_horizon_days: self.max_horizon_days,
            ..AppConfig::default()
        }
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub role: String,
}

impl TestUser {
    pub fn new(role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: role.to_string(),
        }
    }

    pub fn patient() -> Self {
        Self::new("patient")
    }

    pub fn provider() -> Self {
        Self::new("provider")
    }

    pub fn to_user(&self) -> User {
        User::new(self.id).with_role(self.role.clone())
    }

    /// Attach the identity headers the gateway would normally set.
    pub fn authorize(&self, builder: Builder) -> Builder {
        builder
            .header(USER_ID_HEADER, self.id.to_string())
            .header(USER_ROLE_HEADER, self.role.as_str())
    }
}
