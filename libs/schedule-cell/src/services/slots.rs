use chrono::{DateTime, Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::models::{BlockKind, ConcreteBlock, Slot, TimeWindow};

type Interval = (DateTime<Utc>, DateTime<Utc>);

#[derive(Debug, Clone)]
struct Segment {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    slot: Duration,
    step: Duration,
}

/// The bookable slots of one provider at one location over a window.
///
/// Built from concrete blocks and the busy intervals of slot-occupying
/// appointments. Pure: iterating it has no side effects and every call to
/// [`SlotPlan::iter`] yields the same sequence, ordered by start.
#[derive(Debug, Clone)]
pub struct SlotPlan {
    provider_id: Uuid,
    location_id: Uuid,
    window: TimeWindow,
    segments: Vec<Segment>,
    busy: Vec<Interval>,
}

impl SlotPlan {
    pub fn new(
        provider_id: Uuid,
        location_id: Uuid,
        window: TimeWindow,
        blocks: &[ConcreteBlock],
        busy: Vec<Interval>,
    ) -> Self {
        let mut work: Vec<&ConcreteBlock> = blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Work && b.slot_duration_minutes > 0 && b.start < b.end)
            .collect();
        work.sort_by_key(|b| (b.start, b.block_id));

        let mut cuts: Vec<Interval> = blocks
            .iter()
            .filter(|b| b.kind != BlockKind::Work)
            .map(|b| (b.start, b.end))
            .collect();
        cuts.sort();

        let mut segments = Vec::new();
        let mut accepted_end: Option<DateTime<Utc>> = None;

        for block in work {
            if let Some(end) = accepted_end {
                if block.start < end {
                    warn!(
                        "Skipping overlapping work block {} at {} for provider {}",
                        block.block_id, block.start, provider_id
                    );
                    continue;
                }
            }
            accepted_end = Some(block.end);

            let slot = Duration::minutes(i64::from(block.slot_duration_minutes));
            let step = slot + Duration::minutes(i64::from(block.buffer_minutes));

            segments.extend(subtract((block.start, block.end), &cuts).into_iter().map(|(start, end)| Segment {
                start,
                end,
                slot,
                step,
            }));
        }

        let mut busy = busy;
        busy.sort();

        Self {
            provider_id,
            location_id,
            window,
            segments,
            busy,
        }
    }

    pub fn iter(&self) -> SlotIter<'_> {
        SlotIter {
            plan: self,
            segment: 0,
            cursor: self.segments.first().map(|s| s.start),
        }
    }

    /// Whether the plan produces exactly this slot.
    pub fn contains(&self, start_ts: DateTime<Utc>, end_ts: DateTime<Utc>) -> bool {
        self.iter()
            .take_while(|slot| slot.start_ts <= start_ts)
            .any(|slot| slot.start_ts == start_ts && slot.end_ts == end_ts)
    }

    fn is_busy(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.busy.iter().any(|(b_start, b_end)| *b_start < end && start < *b_end)
    }
}

impl<'a> IntoIterator for &'a SlotPlan {
    type Item = Slot;
    type IntoIter = SlotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy walk over a [`SlotPlan`].
pub struct SlotIter<'a> {
    plan: &'a SlotPlan,
    segment: usize,
    cursor: Option<DateTime<Utc>>,
}

impl Iterator for SlotIter<'_> {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        loop {
            let segment = self.plan.segments.get(self.segment)?;
            let start = self.cursor.unwrap_or(segment.start);

            let end = match start.checked_add_signed(segment.slot) {
                Some(end) if end <= segment.end => end,
                _ => {
                    self.next_segment();
                    continue;
                }
            };

            match start.checked_add_signed(segment.step) {
                Some(next) => self.cursor = Some(next),
                None => self.next_segment(),
            }

            if !self.plan.window.contains(start) || self.plan.is_busy(start, end) {
                continue;
            }

            return Some(Slot {
                provider_id: self.plan.provider_id,
                location_id: self.plan.location_id,
                start_ts: start,
                end_ts: end,
            });
        }
    }
}

impl SlotIter<'_> {
    fn next_segment(&mut self) {
        self.segment += 1;
        self.cursor = self.plan.segments.get(self.segment).map(|s| s.start);
    }
}

/// `interval` minus every cut, as ordered disjoint pieces. `cuts` must be sorted.
fn subtract(interval: Interval, cuts: &[Interval]) -> Vec<Interval> {
    let (start, end) = interval;
    let mut pieces = Vec::new();
    let mut cursor = start;

    for (cut_start, cut_end) in cuts {
        if *cut_end <= cursor || *cut_start >= end {
            continue;
        }
        if *cut_start > cursor {
            pieces.push((cursor, *cut_start));
        }
        cursor = cursor.max(*cut_end);
        if cursor >= end {
            break;
        }
    }

    if cursor < end {
        pieces.push((cursor, end));
    }

    pieces
}
