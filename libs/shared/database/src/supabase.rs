use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// SQLSTATE raised by an `EXCLUDE` constraint.
pub const EXCLUSION_VIOLATION: &str = "23P01";
/// SQLSTATE raised by a unique index.
pub const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Constraint violation ({code}): {message}")]
    Constraint {
        code: String,
        message: String,
        details: Option<String>,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SupabaseError {
    pub fn is_exclusion_violation(&self) -> bool {
        matches!(self, SupabaseError::Constraint { code, .. } if code == EXCLUSION_VIOLATION)
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, SupabaseError::Constraint { code, .. } if code == UNIQUE_VIOLATION)
    }

    /// Name of the violated constraint, taken from the quoted identifier
    /// PostgreSQL puts in the message.
    pub fn constraint_name(&self) -> Option<&str> {
        match self {
            SupabaseError::Constraint { message, .. } => {
                let mut parts = message.split('"');
                parts.next()?;
                parts.next()
            }
            _ => None,
        }
    }
}

/// Error body PostgREST returns for failed statements.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_base_url(&config.supabase_url, &config.supabase_service_key)
    }

    pub fn with_base_url(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn get_headers(&self, prefer: Option<&'static str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&self.service_key)
            .map_err(|e| SupabaseError::Config(format!("service key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.service_key))
            .map_err(|e| SupabaseError::Config(format!("service key: {}", e)))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(prefer) = prefer {
            headers.insert("Prefer", HeaderValue::from_static(prefer));
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        prefer: Option<&'static str>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url).headers(self.get_headers(prefer)?);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await?;
            return Err(Self::classify_failure(status, error_text));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            // `return=minimal` writes and 204s carry no body
            return Ok(serde_json::from_value(Value::Array(vec![]))?);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn classify_failure(status: StatusCode, error_text: String) -> SupabaseError {
        let parsed = serde_json::from_str::<PostgrestError>(&error_text).ok();

        if let Some(PostgrestError { code: Some(code), message, details }) = parsed {
            if code.starts_with("23") {
                debug!("Constraint violation {} from PostgREST", code);
                return SupabaseError::Constraint {
                    code,
                    message: message.unwrap_or_default(),
                    details,
                };
            }
        }

        error!("API error ({}): {}", status, error_text);

        match status.as_u16() {
            401 | 403 => SupabaseError::Auth(error_text),
            404 => SupabaseError::NotFound(error_text),
            code => SupabaseError::Api { status: code, body: error_text },
        }
    }
}
