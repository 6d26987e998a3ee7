// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use hold_cell::models::{Hold, HoldId, HoldRequest};
use hold_cell::services::HoldManager;
use schedule_cell::models::check_supported_date;
use schedule_cell::services::ScheduleService;
use shared_models::error::BookingError;

use crate::models::{Appointment, AppointmentStatus, RescheduleOutcome, VisitType};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::repository::AppointmentRepository;

/// Hold placement, confirmation and the appointment lifecycle.
///
/// Stateless: every guarantee comes from the hold store's create-if-absent
/// and the appointment store's insert-time constraints.
pub struct BookingService {
    schedule: Arc<ScheduleService>,
    appointments: Arc<dyn AppointmentRepository>,
    holds: HoldManager,
    lifecycle: AppointmentLifecycleService,
}

impl BookingService {
    pub fn new(
        schedule: Arc<ScheduleService>,
        appointments: Arc<dyn AppointmentRepository>,
        holds: HoldManager,
    ) -> Self {
        Self {
            schedule,
            appointments,
            holds,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    // ==========================================================================
    // HOLDS
    // ==========================================================================

    #[instrument(skip(self, request), fields(provider_id = %request.provider_id, start_ts = %request.start_ts))]
    pub async fn place_hold(&self, request: HoldRequest, requester_id: Uuid) -> Result<Hold, BookingError> {
        if request.start_ts >= request.end_ts {
            return Err(BookingError::InvalidRequest(
                "Slot start must be before its end".to_string(),
            ));
        }
        check_supported_date(request.start_ts.date_naive())?;
        check_supported_date(request.end_ts.date_naive())?;
        if request.start_ts <= Utc::now() {
            return Err(BookingError::InvalidRequest(
                "Slot start must be in the future".to_string(),
            ));
        }

        let in_schedule = self
            .schedule
            .produces_slot(request.provider_id, request.location_id, request.start_ts, request.end_ts)
            .await?;
        if !in_schedule {
            return Err(BookingError::InvalidRequest(
                "Requested time is not a slot of the provider's schedule".to_string(),
            ));
        }

        let booked = self
            .appointments
            .find_active_in_range(request.provider_id, request.location_id, request.start_ts, request.end_ts)
            .await?;
        if !booked.is_empty() {
            warn!("Slot already booked by appointment {}", booked[0].id);
            return Err(BookingError::SlotUnavailable);
        }

        self.holds.create_hold(&request, requester_id).await
    }

    pub async fn get_hold(&self, hold_id: &HoldId) -> Result<Hold, BookingError> {
        self.holds
            .get_hold(hold_id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Hold not found or expired".to_string()))
    }

    pub async fn release_hold(&self, hold_id: &HoldId) -> Result<(), BookingError> {
        if !self.holds.release_hold(hold_id).await? {
            return Err(BookingError::NotFound("Hold not found or expired".to_string()));
        }
        Ok(())
    }

    // ==========================================================================
    // CONFIRMATION
    // ==========================================================================

    /// Turn a live hold into a confirmed appointment. The only way a
    /// `Confirmed` appointment comes into existence.
    #[instrument(skip(self, notes))]
    pub async fn confirm(
        &self,
        hold_id: &HoldId,
        patient_id: Uuid,
        visit_type: VisitType,
        notes: Option<String>,
    ) -> Result<Appointment, BookingError> {
        self.confirm_hold(hold_id, |hold| {
            Appointment::confirmed_from_hold(hold, patient_id, visit_type, notes)
        })
        .await
    }

    async fn confirm_hold<F>(&self, hold_id: &HoldId, build: F) -> Result<Appointment, BookingError>
    where
        F: FnOnce(&Hold) -> Appointment + Send,
    {
        let hold = self.holds.get_hold(hold_id).await?.ok_or_else(|| {
            warn!("Confirmation attempted with expired or unknown hold");
            BookingError::HoldExpired
        })?;

        let booked = self
            .appointments
            .find_active_in_range(hold.provider_id, hold.location_id, hold.start_ts, hold.end_ts)
            .await?;
        if let Some(existing) = booked.first() {
            if &existing.created_from_hold_id == hold_id {
                debug!("Hold already confirmed as appointment {}", existing.id);
                return Err(BookingError::HoldExpired);
            }
            warn!("Held slot was booked meanwhile by appointment {}", existing.id);
            return Err(BookingError::SlotAlreadyBooked);
        }

        let appointment = self.appointments.insert_confirmed(build(&hold)).await?;
        info!(
            "Appointment {} confirmed for provider {} at {}",
            appointment.id, appointment.provider_id, appointment.start_ts
        );

        match self.holds.release_hold(hold_id).await {
            Ok(true) => {}
            Ok(false) => debug!("Hold for appointment {} was already gone", appointment.id),
            Err(e) => warn!(
                "Failed to release hold after confirming {}, it will expire by TTL: {}",
                appointment.id, e
            ),
        }

        Ok(appointment)
    }

    // ==========================================================================
    // LIFECYCLE
    // ==========================================================================

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        self.appointments
            .get(appointment_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("Appointment {}", appointment_id)))
    }

    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        if !self.lifecycle.is_direct_target(target) {
            return Err(BookingError::InvalidRequest(format!(
                "Appointments move to {} only through a reschedule",
                target
            )));
        }

        let current = self.get_appointment(appointment_id).await?;
        let updated = self.apply_transition(&current, target).await?;

        info!("Appointment {} moved {} -> {}", appointment_id, current.status, target);
        Ok(updated)
    }

    async fn apply_transition(
        &self,
        current: &Appointment,
        target: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        self.lifecycle.validate_status_transition(current.status, target)?;

        match self.appointments.update_status(current.id, current.status, target).await? {
            Some(updated) => Ok(updated),
            None => {
                // Lost a race; report against whatever status won
                let latest = self.get_appointment(current.id).await?;
                warn!(
                    "Concurrent transition on appointment {}: now {}",
                    current.id, latest.status
                );
                Err(BookingError::IllegalTransition {
                    from: latest.status.to_string(),
                    to: target.to_string(),
                })
            }
        }
    }

    /// Move a confirmed appointment onto the slot behind `new_hold_id`.
    #[instrument(skip(self, new_hold_id))]
    pub async fn reschedule(
        &self,
        appointment_id: Uuid,
        new_hold_id: &HoldId,
    ) -> Result<RescheduleOutcome, BookingError> {
        let current = self.get_appointment(appointment_id).await?;
        self.lifecycle
            .validate_status_transition(current.status, AppointmentStatus::Rescheduled)?;

        let replacement = self
            .confirm_hold(new_hold_id, |hold| {
                let mut appointment = Appointment::confirmed_from_hold(
                    hold,
                    current.patient_id,
                    current.visit_type.clone(),
                    current.notes.clone(),
                );
                appointment.rescheduled_from = Some(current.id);
                appointment
            })
            .await?;

        match self.apply_transition(&current, AppointmentStatus::Rescheduled).await {
            Ok(previous) => {
                info!("Appointment {} rescheduled to {}", previous.id, replacement.id);
                Ok(RescheduleOutcome { previous, replacement })
            }
            Err(e) => {
                self.cancel_replacement(&replacement).await;
                Err(e)
            }
        }
    }

    async fn cancel_replacement(&self, replacement: &Appointment) {
        let cancelled = self
            .appointments
            .update_status(replacement.id, AppointmentStatus::Confirmed, AppointmentStatus::Cancelled)
            .await;

        match cancelled {
            Ok(Some(_)) => warn!("Cancelled replacement appointment {} after failed reschedule", replacement.id),
            Ok(None) => error!("Replacement appointment {} changed before it could be cancelled", replacement.id),
            Err(e) => error!("Failed to cancel replacement appointment {}: {}", replacement.id, e),
        }
    }
}
