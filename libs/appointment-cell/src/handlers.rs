// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use hold_cell::models::{Hold, HoldId, HoldRequest};
use schedule_cell::models::Slot;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AvailabilityQuery, ConfirmBookingRequest, HoldGranted, RescheduleOutcome,
    RescheduleRequest, TransitionRequest,
};
use crate::router::BookingState;

// ==============================================================================
// AVAILABILITY
// ==============================================================================

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<BookingState>>,
    Path((provider_id, location_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Slot>>, AppError> {
    let slots = state
        .availability
        .compute_availability(provider_id, location_id, query.from, query.to)
        .await?;

    Ok(Json(slots))
}

// ==============================================================================
// HOLDS
// ==============================================================================

#[axum::debug_handler]
pub async fn place_hold(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<HoldRequest>,
) -> Result<(StatusCode, Json<HoldGranted>), AppError> {
    let hold = state.booking.place_hold(request, user.id).await?;
    Ok((StatusCode::CREATED, Json(HoldGranted::from(&hold))))
}

#[axum::debug_handler]
pub async fn get_hold(
    State(state): State<Arc<BookingState>>,
    Path(hold_id): Path<String>,
) -> Result<Json<Hold>, AppError> {
    let hold = state.booking.get_hold(&HoldId::from(hold_id)).await?;
    Ok(Json(hold))
}

#[axum::debug_handler]
pub async fn release_hold(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Path(hold_id): Path<String>,
) -> Result<StatusCode, AppError> {
    debug!("User {} releasing hold", user.id);
    state.booking.release_hold(&HoldId::from(hold_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<ConfirmBookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    debug!("User {} confirming booking for patient {}", user.id, request.patient_id);

    let appointment = state
        .booking
        .confirm(&request.hold_id, request.patient_id, request.visit_type, request.notes)
        .await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<BookingState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.booking.get_appointment(appointment_id).await?;
    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn transition_appointment(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Appointment>, AppError> {
    debug!("User {} requesting {} on {}", user.id, request.target_state, appointment_id);

    let appointment = state
        .booking
        .transition(appointment_id, request.target_state)
        .await?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<RescheduleOutcome>, AppError> {
    debug!("User {} rescheduling {}", user.id, appointment_id);

    let outcome = state
        .booking
        .reschedule(appointment_id, &request.hold_id)
        .await?;

    Ok(Json(outcome))
}
