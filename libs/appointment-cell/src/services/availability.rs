use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use hold_cell::models::SlotKey;
use hold_cell::services::HoldManager;
use schedule_cell::models::{DateRange, Slot};
use schedule_cell::services::ScheduleService;
use shared_models::error::BookingError;

use crate::services::repository::AppointmentRepository;

/// Bookable slots for a provider at a location, net of appointments and
/// (best effort) live holds.
pub struct AvailabilityService {
    schedule: Arc<ScheduleService>,
    appointments: Arc<dyn AppointmentRepository>,
    holds: HoldManager,
    max_horizon_days: u32,
}

impl AvailabilityService {
    pub fn new(
        schedule: Arc<ScheduleService>,
        appointments: Arc<dyn AppointmentRepository>,
        holds: HoldManager,
        max_horizon_days: u32,
    ) -> Self {
        Self {
            schedule,
            appointments,
            holds,
            max_horizon_days,
        }
    }

    #[instrument(skip(self))]
    pub async fn compute_availability(
        &self,
        provider_id: Uuid,
        location_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Slot>, BookingError> {
        let range = DateRange::new(from, to, self.max_horizon_days)?;
        let window = range.window();

        // Slots starting near the end of the window may run past it, by at most a day
        let busy_until = window
            .end
            .checked_add_signed(Duration::days(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let busy: Vec<_> = self
            .appointments
            .find_active_in_range(provider_id, location_id, window.start, busy_until)
            .await?
            .into_iter()
            .map(|a| (a.start_ts, a.end_ts))
            .collect();

        let plan = self.schedule.slot_plan(provider_id, location_id, window, busy).await?;

        let now = Utc::now();
        let slots: Vec<Slot> = plan.iter().filter(|slot| slot.start_ts > now).collect();

        let slots = self.without_held(slots).await;
        debug!("{} slots available for provider {} at {}", slots.len(), provider_id, location_id);

        Ok(slots)
    }

    async fn without_held(&self, slots: Vec<Slot>) -> Vec<Slot> {
        if slots.is_empty() {
            return slots;
        }

        let keys: Vec<SlotKey> = slots
            .iter()
            .map(|s| SlotKey::new(s.provider_id, s.location_id, s.start_ts))
            .collect();

        match self.holds.claimed(&keys).await {
            Ok(claimed) => slots
                .into_iter()
                .zip(claimed)
                .filter_map(|(slot, held)| (!held).then_some(slot))
                .collect(),
            Err(e) => {
                warn!("Hold lookup failed, returning slots unfiltered: {}", e);
                slots
            }
        }
    }
}
