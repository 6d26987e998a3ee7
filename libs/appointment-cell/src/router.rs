// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use hold_cell::services::HoldManager;
use schedule_cell::services::ScheduleService;
use shared_utils::extractor::identity_middleware;

use crate::handlers;
use crate::services::{AppointmentRepository, AvailabilityService, BookingService};

pub struct BookingState {
    pub availability: AvailabilityService,
    pub booking: BookingService,
}

impl BookingState {
    pub fn new(
        schedule: Arc<ScheduleService>,
        appointments: Arc<dyn AppointmentRepository>,
        holds: HoldManager,
        max_horizon_days: u32,
    ) -> Self {
        Self {
            availability: AvailabilityService::new(
                schedule.clone(),
                appointments.clone(),
                holds.clone(),
                max_horizon_days,
            ),
            booking: BookingService::new(schedule, appointments, holds),
        }
    }
}

pub fn booking_routes(state: Arc<BookingState>) -> Router {
    // Public routes (no identity required)
    let public_routes = Router::new().route(
        "/providers/{provider_id}/locations/{location_id}/availability",
        get(handlers::get_availability),
    );

    // Protected routes (identity required)
    let protected_routes = Router::new()
        .route("/holds", post(handlers::place_hold))
        .route("/holds/{hold_id}", get(handlers::get_hold).delete(handlers::release_hold))
        .route("/appointments/confirm", post(handlers::confirm_booking))
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .route("/appointments/{appointment_id}/transition", post(handlers::transition_appointment))
        .route("/appointments/{appointment_id}/reschedule", post(handlers::reschedule_appointment))
        .layer(middleware::from_fn(identity_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
