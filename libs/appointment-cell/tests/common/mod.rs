#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus};
use appointment_cell::router::BookingState;
use appointment_cell::services::{AppointmentRepository, InMemoryAppointmentRepository};
use hold_cell::error::HoldStoreError;
use hold_cell::models::{Hold, HoldId, HoldRequest, SlotKey};
use hold_cell::services::{HoldManager, HoldStore, InMemoryHoldStore};
use shared_models::error::BookingError;
use schedule_cell::models::{BlockKind, BlockTiming, ScheduleBlock};
use schedule_cell::services::{InMemoryScheduleStore, ScheduleService, ScheduleStore};

pub struct Harness {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub day: NaiveDate,
    pub appointments: Arc<InMemoryAppointmentRepository>,
    pub holds: HoldManager,
    pub state: Arc<BookingState>,
}

impl Harness {
    /// Provider works 09:00-12:00 UTC two days from now in 30 minute slots.
    pub async fn new(ttl_seconds: u64) -> Self {
        Self::with_hold_store(Arc::new(InMemoryHoldStore::new()), ttl_seconds).await
    }

    pub async fn with_hold_store(store: Arc<dyn HoldStore>, ttl_seconds: u64) -> Self {
        let appointments = Arc::new(InMemoryAppointmentRepository::new());
        Self::build(store, ttl_seconds, appointments.clone(), appointments).await
    }

    /// Services write through `repository`, which must wrap `appointments`.
    pub async fn with_repository(
        repository: Arc<dyn AppointmentRepository>,
        appointments: Arc<InMemoryAppointmentRepository>,
    ) -> Self {
        Self::build(Arc::new(InMemoryHoldStore::new()), 120, repository, appointments).await
    }

    async fn build(
        store: Arc<dyn HoldStore>,
        ttl_seconds: u64,
        repository: Arc<dyn AppointmentRepository>,
        appointments: Arc<InMemoryAppointmentRepository>,
    ) -> Self {
        let provider_id = Uuid::new_v4();
        let location_id = Uuid::new_v4();
        let day = Utc::now().date_naive() + Duration::days(2);

        let schedule_store = Arc::new(InMemoryScheduleStore::new());
        schedule_store
            .save_block(ScheduleBlock {
                id: Uuid::new_v4(),
                provider_id,
                location_id,
                kind: BlockKind::Work,
                timing: BlockTiming::OneOff {
                    start_ts: at_on(day, 9, 0),
                    end_ts: at_on(day, 12, 0),
                },
                slot_duration_minutes: 30,
                buffer_minutes: 0,
                updated_at: Utc::now(),
            })
            .await
            .unwrap();

        let schedule = Arc::new(ScheduleService::new(schedule_store));
        let holds = HoldManager::new(store, ttl_seconds);
        let state = Arc::new(BookingState::new(schedule, repository, holds.clone(), 90));

        Self {
            provider_id,
            location_id,
            day,
            appointments,
            holds,
            state,
        }
    }

    pub fn at(&self, h: u32, m: u32) -> DateTime<Utc> {
        at_on(self.day, h, m)
    }

    /// The 30 minute slot starting at `h:m`.
    pub fn slot(&self, h: u32, m: u32) -> HoldRequest {
        HoldRequest {
            provider_id: self.provider_id,
            location_id: self.location_id,
            start_ts: self.at(h, m),
            end_ts: self.at(h, m) + Duration::minutes(30),
        }
    }
}

pub fn at_on(day: NaiveDate, h: u32, m: u32) -> DateTime<Utc> {
    day.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap()).and_utc()
}

/// A cache that is down.
pub struct UnreachableHoldStore;

#[async_trait]
impl HoldStore for UnreachableHoldStore {
    async fn create_if_absent(&self, _: &SlotKey, _: &Hold, _: u64) -> Result<bool, HoldStoreError> {
        Err(HoldStoreError::Pool("connection refused".to_string()))
    }

    async fn get(&self, _: &SlotKey) -> Result<Option<Hold>, HoldStoreError> {
        Err(HoldStoreError::Pool("connection refused".to_string()))
    }

    async fn get_many(&self, _: &[SlotKey]) -> Result<Vec<Option<Hold>>, HoldStoreError> {
        Err(HoldStoreError::Pool("connection refused".to_string()))
    }

    async fn delete(&self, _: &SlotKey, _: &HoldId) -> Result<bool, HoldStoreError> {
        Err(HoldStoreError::Pool("connection refused".to_string()))
    }
}

/// Appointment store where another request cancels the contested appointment
/// just before any status change this harness asks for.
pub struct ContestedAppointmentRepository {
    pub inner: Arc<InMemoryAppointmentRepository>,
    contested: Mutex<Option<Uuid>>,
    inserted: Mutex<Vec<Uuid>>,
}

impl ContestedAppointmentRepository {
    pub fn new(inner: Arc<InMemoryAppointmentRepository>) -> Self {
        Self {
            inner,
            contested: Mutex::new(None),
            inserted: Mutex::new(Vec::new()),
        }
    }

    pub fn contest(&self, appointment_id: Uuid) {
        *self.contested.lock().unwrap() = Some(appointment_id);
    }

    pub fn inserted(&self) -> Vec<Uuid> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppointmentRepository for ContestedAppointmentRepository {
    async fn find_active_in_range(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError> {
        self.inner.find_active_in_range(provider_id, location_id, start, end).await
    }

    async fn insert_confirmed(&self, appointment: Appointment) -> Result<Appointment, BookingError> {
        let inserted = self.inner.insert_confirmed(appointment).await?;
        self.inserted.lock().unwrap().push(inserted.id);
        Ok(inserted)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, BookingError> {
        self.inner.get(id).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, BookingError> {
        let contested = *self.contested.lock().unwrap();
        if contested == Some(id) {
            self.inner.update_status(id, from, AppointmentStatus::Cancelled).await?;
            return Ok(None);
        }
        self.inner.update_status(id, from, to).await
    }
}
