use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{booking_routes, BookingState};
use appointment_cell::services::AppointmentRepository;
use hold_cell::services::HoldManager;
use schedule_cell::router::schedule_routes;
use schedule_cell::services::ScheduleService;

pub struct Services {
    pub schedule: Arc<ScheduleService>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub holds: HoldManager,
    pub max_horizon_days: u32,
}

pub fn create_router(services: Services) -> Router {
    let booking_state = Arc::new(BookingState::new(
        services.schedule.clone(),
        services.appointments,
        services.holds,
        services.max_horizon_days,
    ));

    let booking = booking_routes(booking_state).merge(schedule_routes(services.schedule));

    Router::new()
        .route("/", get(|| async { "Slot booking API is running!" }))
        .nest("/booking", booking)
}
