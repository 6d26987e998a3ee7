use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// How a booking failure should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected outcome of contention. Surface to the caller, never retry here.
    Conflict,
    /// Malformed or unknown input.
    Request,
    /// Schedule data that cannot be honoured.
    Configuration,
    /// Cache or durable store could not be reached. Callers may retry with backoff.
    Infrastructure,
}

/// Every outcome a booking-core operation can fail with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("Slot is already held or booked")]
    SlotUnavailable,

    #[error("Slot was booked by another confirmation")]
    SlotAlreadyBooked,

    #[error("Hold has expired or does not exist")]
    HoldExpired,

    #[error("Illegal appointment transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl BookingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            BookingError::SlotUnavailable
            | BookingError::SlotAlreadyBooked
            | BookingError::HoldExpired
            | BookingError::IllegalTransition { .. } => ErrorClass::Conflict,
            BookingError::NotFound(_) | BookingError::InvalidRequest(_) => ErrorClass::Request,
            BookingError::InvalidSchedule(_) => ErrorClass::Configuration,
            BookingError::StoreUnavailable(_) => ErrorClass::Infrastructure,
        }
    }

    /// Stable machine-readable code sent to API callers.
    pub fn reason(&self) -> &'static str {
        match self {
            BookingError::SlotUnavailable => "SLOT_UNAVAILABLE",
            BookingError::SlotAlreadyBooked => "SLOT_ALREADY_BOOKED",
            BookingError::HoldExpired => "HOLD_EXPIRED",
            BookingError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::InvalidRequest(_) => "INVALID_REQUEST",
            BookingError::InvalidSchedule(_) => "INVALID_SCHEDULE",
            BookingError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Infrastructure
    }

    pub fn store_unavailable(err: impl std::fmt::Display) -> Self {
        BookingError::StoreUnavailable(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Conflict ({reason}): {message}")]
    Conflict { reason: &'static str, message: String },

    #[error("Unprocessable schedule: {0}")]
    InvalidSchedule(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::InvalidSchedule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "UNAUTHENTICATED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "INVALID_REQUEST",
            AppError::Conflict { reason, .. } => *reason,
            AppError::InvalidSchedule(_) => "INVALID_SCHEDULE",
            AppError::ServiceUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound(msg) => AppError::NotFound(msg),
            BookingError::InvalidRequest(msg) => AppError::BadRequest(msg),
            BookingError::InvalidSchedule(msg) => AppError::InvalidSchedule(msg),
            BookingError::StoreUnavailable(msg) => AppError::ServiceUnavailable(msg),
            conflict => AppError::Conflict {
                reason: conflict.reason(),
                message: conflict.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = self.reason();
        let message = match &self {
            AppError::Conflict { message, .. } => message.clone(),
            AppError::Auth(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::InvalidSchedule(msg)
            | AppError::ServiceUnavailable(msg) => msg.clone(),
        };

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::warn!("Request rejected: {} {}: {}", status, reason, message);
        }

        let body = Json(json!({
            "error": message,
            "reason": reason,
        }));

        (status, body).into_response()
    }
}
