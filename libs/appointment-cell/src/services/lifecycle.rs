// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::error::BookingError;

use crate::models::AppointmentStatus;

/// The appointment state machine. Pure; persistence lives in the repository.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::IllegalTransition {
                from: current_status.to_string(),
                to: new_status.to_string(),
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Started,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::Started => vec![AppointmentStatus::Completed],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::Rescheduled => vec![],
        }
    }

    /// Targets a caller may request directly. `Rescheduled` only happens as
    /// part of a reschedule.
    pub fn is_direct_target(&self, target: AppointmentStatus) -> bool {
        matches!(
            target,
            AppointmentStatus::Started | AppointmentStatus::Completed | AppointmentStatus::Cancelled
        )
    }
}
