use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use shared_models::error::BookingError;

use crate::models::{Appointment, AppointmentStatus};

/// Durable appointment storage.
///
/// `insert_confirmed` is the secondary guard against double booking: it must
/// reject an appointment overlapping a slot-occupying one of the same
/// provider and location (`SlotAlreadyBooked`) and a second appointment for
/// the same hold (`HoldExpired`) in the same atomic write.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Slot-occupying appointments intersecting `[start, end)`, ordered by start.
    async fn find_active_in_range(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError>;

    async fn insert_confirmed(&self, appointment: Appointment) -> Result<Appointment, BookingError>;

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, BookingError>;

    /// Compare-and-set on status. `Ok(None)` when the stored status is no
    /// longer `from` (or the appointment does not exist).
    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, BookingError>;
}

#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: Mutex<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.appointments.lock().await.len()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn find_active_in_range(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let appointments = self.appointments.lock().await;
        let mut found: Vec<Appointment> = appointments
            .values()
            .filter(|a| {
                a.provider_id == provider_id
                    && a.location_id == location_id
                    && a.status.occupies_slot()
                    && a.overlaps(start, end)
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| a.start_ts);
        Ok(found)
    }

    async fn insert_confirmed(&self, appointment: Appointment) -> Result<Appointment, BookingError> {
        let mut appointments = self.appointments.lock().await;

        if appointments
            .values()
            .any(|a| a.created_from_hold_id == appointment.created_from_hold_id)
        {
            return Err(BookingError::HoldExpired);
        }

        let clash = appointment.status.occupies_slot()
            && appointments.values().any(|a| {
                a.provider_id == appointment.provider_id
                    && a.location_id == appointment.location_id
                    && a.status.occupies_slot()
                    && a.overlaps(appointment.start_ts, appointment.end_ts)
            });
        if clash {
            return Err(BookingError::SlotAlreadyBooked);
        }

        appointments.insert(appointment.id, appointment.clone());
        debug!("Inserted appointment {}", appointment.id);
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, BookingError> {
        Ok(self.appointments.lock().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, BookingError> {
        let mut appointments = self.appointments.lock().await;

        match appointments.get_mut(&id) {
            Some(appointment) if appointment.status == from => {
                appointment.status = to;
                appointment.updated_at = Utc::now();
                Ok(Some(appointment.clone()))
            }
            _ => Ok(None),
        }
    }
}
