#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use uuid::Uuid;

use schedule_cell::models::{BlockKind, BlockTiming, ScheduleBlock, WeekPattern};

/// 2030-01-07 is a Monday.
pub fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, day, h, m, 0).unwrap()
}

pub fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, day).unwrap()
}

pub fn one_off(
    provider_id: Uuid,
    location_id: Uuid,
    kind: BlockKind,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    slot: u32,
    buffer: u32,
) -> ScheduleBlock {
    ScheduleBlock {
        id: Uuid::new_v4(),
        provider_id,
        location_id,
        kind,
        timing: BlockTiming::OneOff { start_ts: start, end_ts: end },
        slot_duration_minutes: slot,
        buffer_minutes: buffer,
        updated_at: Utc::now(),
    }
}

pub fn weekly(
    provider_id: Uuid,
    location_id: Uuid,
    weekday: Weekday,
    start: (u32, u32),
    end: (u32, u32),
    utc_offset_minutes: i32,
    valid: (NaiveDate, Option<NaiveDate>),
) -> ScheduleBlock {
    ScheduleBlock {
        id: Uuid::new_v4(),
        provider_id,
        location_id,
        kind: BlockKind::Work,
        timing: BlockTiming::Weekly(WeekPattern {
            weekday,
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            utc_offset_minutes,
            valid_from: valid.0,
            valid_until: valid.1,
        }),
        slot_duration_minutes: 30,
        buffer_minutes: 0,
        updated_at: Utc::now(),
    }
}
