use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::BookingError;

// ==============================================================================
// SCHEDULE BLOCKS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Work,
    Break,
    Holiday,
}

/// A weekly recurring interval in the provider's local time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekPattern {
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    /// `00:00` means midnight at the end of `weekday`.
    pub end_time: NaiveTime,
    /// Fixed offset of the provider's local time from UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub valid_from: NaiveDate,
    /// Inclusive. `None` repeats indefinitely.
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl WeekPattern {
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_until.map_or(true, |until| date <= until)
    }

    pub fn ends_at_midnight(&self) -> bool {
        self.end_time == NaiveTime::MIN
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockTiming {
    OneOff {
        start_ts: DateTime<Utc>,
        end_ts: DateTime<Utc>,
    },
    Weekly(WeekPattern),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleBlock {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub kind: BlockKind,
    pub timing: BlockTiming,
    #[serde(default)]
    pub slot_duration_minutes: u32,
    #[serde(default)]
    pub buffer_minutes: u32,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleBlock {
    pub fn is_work(&self) -> bool {
        self.kind == BlockKind::Work
    }

    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_duration_minutes))
    }

    pub fn buffer(&self) -> Duration {
        Duration::minutes(i64::from(self.buffer_minutes))
    }
}

/// One materialized occurrence of a block. Derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConcreteBlock {
    pub block_id: Uuid,
    pub location_id: Uuid,
    pub kind: BlockKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub slot_duration_minutes: u32,
    pub buffer_minutes: u32,
}

impl ConcreteBlock {
    pub fn overlaps(&self, other: &ConcreteBlock) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Slot {
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
}

// ==============================================================================
// WINDOWS
// ==============================================================================

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The whole UTC calendar day containing `instant`.
    pub fn day_of(instant: DateTime<Utc>) -> Self {
        let date = instant.date_naive();
        Self::new(start_of_day(date), end_of_day(date))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn intersects(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && self.start < end
    }
}

/// Inclusive range of UTC calendar dates an availability query covers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate, max_horizon_days: u32) -> Result<Self, BookingError> {
        check_supported_date(from)?;
        check_supported_date(to)?;

        if from > to {
            return Err(BookingError::InvalidRequest(format!(
                "Date range start {} is after end {}",
                from, to
            )));
        }

        let days = (to - from).num_days() + 1;
        if days > i64::from(max_horizon_days) {
            return Err(BookingError::InvalidRequest(format!(
                "Date range spans {} days, maximum is {}",
                days, max_horizon_days
            )));
        }

        Ok(Self { from, to })
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(start_of_day(self.from), end_of_day(self.to))
    }
}

/// Calendar years schedules, queries and holds may refer to.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1..=9999;

pub fn check_supported_date(date: NaiveDate) -> Result<(), BookingError> {
    if SUPPORTED_YEARS.contains(&date.year()) {
        Ok(())
    } else {
        Err(BookingError::InvalidRequest(format!(
            "Date {} is outside the supported calendar",
            date
        )))
    }
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Midnight after `date`, saturating at the last representable instant.
pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.succ_opt().map_or(DateTime::<Utc>::MAX_UTC, start_of_day)
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertBlockRequest {
    /// Present when replacing an existing block.
    pub id: Option<Uuid>,
    pub location_id: Uuid,
    pub kind: BlockKind,
    pub timing: BlockTiming,
    #[serde(default)]
    pub slot_duration_minutes: u32,
    #[serde(default)]
    pub buffer_minutes: u32,
}

impl UpsertBlockRequest {
    pub fn into_block(self, provider_id: Uuid) -> ScheduleBlock {
        ScheduleBlock {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            provider_id,
            location_id: self.location_id,
            kind: self.kind,
            timing: self.timing,
            slot_duration_minutes: self.slot_duration_minutes,
            buffer_minutes: self.buffer_minutes,
            updated_at: Utc::now(),
        }
    }
}
