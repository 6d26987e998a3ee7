use chrono::{Datelike, Duration};

use shared_models::error::BookingError;

use crate::models::{start_of_day, BlockTiming, ScheduleBlock, TimeWindow, SUPPORTED_YEARS};
use crate::services::materialize::expand_block;

const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Availability looks one day past its window for appointments, so no slot
/// may be longer than that.
pub const MAX_SLOT_DURATION_MINUTES: u32 = 24 * 60;

/// Structural checks on a single block.
pub fn validate_block(block: &ScheduleBlock) -> Result<(), BookingError> {
    match &block.timing {
        BlockTiming::OneOff { start_ts, end_ts } => {
            if start_ts >= end_ts {
                return Err(invalid("Block start must be before its end"));
            }
            if !in_supported_years(start_ts.year()) || !in_supported_years(end_ts.year()) {
                return Err(invalid("Block lies outside the supported calendar"));
            }
        }
        BlockTiming::Weekly(pattern) => {
            if !pattern.ends_at_midnight() && pattern.start_time >= pattern.end_time {
                return Err(invalid("Weekly start time must be before its end time"));
            }
            let until_year = pattern.valid_until.map_or(pattern.valid_from.year(), |until| until.year());
            if !in_supported_years(pattern.valid_from.year()) || !in_supported_years(until_year) {
                return Err(invalid("Validity dates lie outside the supported calendar"));
            }
            if pattern.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
                return Err(invalid("UTC offset must be within 14 hours"));
            }
            if let Some(until) = pattern.valid_until {
                if until < pattern.valid_from {
                    return Err(invalid("valid_until must not precede valid_from"));
                }
            }
        }
    }

    if block.is_work() && block.slot_duration_minutes == 0 {
        return Err(invalid("Work blocks need a positive slot duration"));
    }
    if block.slot_duration_minutes > MAX_SLOT_DURATION_MINUTES {
        return Err(invalid("Slots may not be longer than a day"));
    }

    Ok(())
}

fn in_supported_years(year: i32) -> bool {
    SUPPORTED_YEARS.contains(&year)
}

/// Rejects a work block that overlaps any other work block of the same
/// provider, at any location, on any day both materialize to.
pub fn check_work_overlap(candidate: &ScheduleBlock, existing: &[ScheduleBlock]) -> Result<(), BookingError> {
    if !candidate.is_work() {
        return Ok(());
    }

    let conflict = existing
        .iter()
        .filter(|other| other.id != candidate.id && other.is_work())
        .find(|other| blocks_overlap(candidate, other));

    match conflict {
        Some(other) => Err(invalid(&format!(
            "Work block overlaps existing work block {}",
            other.id
        ))),
        None => Ok(()),
    }
}

fn blocks_overlap(a: &ScheduleBlock, b: &ScheduleBlock) -> bool {
    let Some(window) = comparison_window(a, b) else {
        return false;
    };

    let a_blocks = expand_block(a, window);
    let b_blocks = expand_block(b, window);

    a_blocks
        .iter()
        .any(|left| b_blocks.iter().any(|right| left.overlaps(right)))
}

/// A window wide enough that two blocks overlap somewhere iff they overlap
/// inside it. Weekly patterns repeat, so a bit over a week of their common
/// validity is enough.
fn comparison_window(a: &ScheduleBlock, b: &ScheduleBlock) -> Option<TimeWindow> {
    let (from, until) = match (&a.timing, &b.timing) {
        (BlockTiming::OneOff { start_ts, end_ts }, _) | (_, BlockTiming::OneOff { start_ts, end_ts }) => {
            (start_ts.date_naive(), end_ts.date_naive())
        }
        (BlockTiming::Weekly(pa), BlockTiming::Weekly(pb)) => {
            let from = pa.valid_from.max(pb.valid_from);
            let until = match (pa.valid_until, pb.valid_until) {
                (Some(x), Some(y)) => Some(x.min(y)),
                (x, y) => x.or(y),
            };
            if until.is_some_and(|until| until < from) {
                return None;
            }
            let week_end = from + Duration::days(8);
            (from, until.map_or(week_end, |until| until.min(week_end)))
        }
    };

    Some(TimeWindow::new(
        start_of_day(from) - Duration::days(1),
        start_of_day(until) + Duration::days(2),
    ))
}

fn invalid(message: &str) -> BookingError {
    BookingError::InvalidSchedule(message.to_string())
}
