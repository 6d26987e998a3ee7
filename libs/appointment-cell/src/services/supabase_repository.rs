use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_database::supabase::{SupabaseClient, SupabaseError};
use shared_models::error::BookingError;

use crate::models::{Appointment, AppointmentStatus};
use crate::services::repository::AppointmentRepository;

const TABLE_PATH: &str = "/rest/v1/appointments";
const OCCUPYING_FILTER: &str = "status=in.(confirmed,started,completed)";

/// Appointments in PostgreSQL behind PostgREST. Overlap and hold reuse are
/// rejected by the table's exclusion constraint and unique index.
pub struct SupabaseAppointmentRepository {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentRepository {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

// Z suffix keeps '+' out of the query string
fn ts(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn map_error(err: SupabaseError) -> BookingError {
    if err.is_exclusion_violation() {
        warn!("Appointment overlap rejected by store: {:?}", err.constraint_name());
        return BookingError::SlotAlreadyBooked;
    }
    if err.is_unique_violation() {
        warn!("Duplicate appointment for hold rejected by store: {:?}", err.constraint_name());
        return BookingError::HoldExpired;
    }

    error!("Appointment store request failed: {}", err);
    BookingError::store_unavailable(err)
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn find_active_in_range(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let path = format!(
            "{}?provider_id=eq.{}&location_id=eq.{}&{}&start_ts=lt.{}&end_ts=gt.{}&order=start_ts.asc",
            TABLE_PATH,
            provider_id,
            location_id,
            OCCUPYING_FILTER,
            ts(end),
            ts(start)
        );

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(map_error)?;

        debug!("Found {} active appointments in range", appointments.len());
        Ok(appointments)
    }

    async fn insert_confirmed(&self, appointment: Appointment) -> Result<Appointment, BookingError> {
        let body = serde_json::to_value(&appointment).map_err(BookingError::store_unavailable)?;

        let inserted: Vec<Appointment> = self
            .supabase
            .request(Method::POST, TABLE_PATH, Some(body), Some("return=representation"))
            .await
            .map_err(map_error)?;

        inserted
            .into_iter()
            .next()
            .ok_or_else(|| BookingError::store_unavailable("appointment insert returned no row"))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, BookingError> {
        let path = format!("{}?id=eq.{}", TABLE_PATH, id);

        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(map_error)?;

        Ok(appointments.into_iter().next())
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Appointment>, BookingError> {
        // The status filter makes the PATCH a compare-and-set
        let path = format!("{}?id=eq.{}&status=eq.{}", TABLE_PATH, id, from);
        let body = json!({
            "status": to,
            "updated_at": Utc::now(),
        });

        let updated: Vec<Appointment> = self
            .supabase
            .request(Method::PATCH, &path, Some(body), Some("return=representation"))
            .await
            .map_err(map_error)?;

        Ok(updated.into_iter().next())
    }
}
