use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{BlockTiming, ConcreteBlock, ScheduleBlock, TimeWindow, WeekPattern};

/// Entries kept before the cache is dropped wholesale.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Materialize every occurrence of `block` that intersects `window`.
/// Occurrences are returned whole, not clipped to the window.
pub fn expand_block(block: &ScheduleBlock, window: TimeWindow) -> Vec<ConcreteBlock> {
    match &block.timing {
        BlockTiming::OneOff { start_ts, end_ts } => {
            if window.intersects(*start_ts, *end_ts) {
                vec![concrete(block, *start_ts, *end_ts)]
            } else {
                Vec::new()
            }
        }
        BlockTiming::Weekly(pattern) => expand_pattern(block, pattern, window),
    }
}

fn expand_pattern(block: &ScheduleBlock, pattern: &WeekPattern, window: TimeWindow) -> Vec<ConcreteBlock> {
    let offset = Duration::minutes(i64::from(pattern.utc_offset_minutes));

    // Local dates one day either side of the UTC window can still land inside it
    let first = window.start.date_naive();
    let first = first.pred_opt().unwrap_or(first);
    let last = window.end.date_naive();
    let last = last.succ_opt().unwrap_or(last);

    first
        .iter_days()
        .take_while(|date| *date <= last)
        .filter(|date| date.weekday() == pattern.weekday && pattern.is_valid_on(*date))
        .filter_map(|date| {
            let start = local_to_utc(date, pattern.start_time, offset)?;
            let end = if pattern.ends_at_midnight() {
                local_to_utc(date.succ_opt()?, NaiveTime::MIN, offset)?
            } else {
                local_to_utc(date, pattern.end_time, offset)?
            };
            window.intersects(start, end).then(|| concrete(block, start, end))
        })
        .collect()
}

fn local_to_utc(date: NaiveDate, time: NaiveTime, offset: Duration) -> Option<DateTime<Utc>> {
    date.and_time(time).and_utc().checked_sub_signed(offset)
}

fn concrete(block: &ScheduleBlock, start: DateTime<Utc>, end: DateTime<Utc>) -> ConcreteBlock {
    ConcreteBlock {
        block_id: block.id,
        location_id: block.location_id,
        kind: block.kind,
        start,
        end,
        slot_duration_minutes: block.slot_duration_minutes,
        buffer_minutes: block.buffer_minutes,
    }
}

type CacheKey = (Uuid, DateTime<Utc>, DateTime<Utc>, DateTime<Utc>);

/// Memoized `expand_block` results. Keys include `updated_at`, so an edited
/// block simply misses and stale entries age out on the next clear.
pub struct ExpansionCache {
    entries: RwLock<HashMap<CacheKey, Vec<ConcreteBlock>>>,
    capacity: usize,
}

impl Default for ExpansionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ExpansionCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn expand(&self, block: &ScheduleBlock, window: TimeWindow) -> Vec<ConcreteBlock> {
        let key = (block.id, block.updated_at, window.start, window.end);

        if let Some(hit) = self.entries.read().await.get(&key) {
            return hit.clone();
        }

        let expanded = expand_block(block, window);

        let mut entries = self.entries.write().await;
        if entries.len() >= self.capacity {
            debug!("Expansion cache full ({} entries), clearing", entries.len());
            entries.clear();
        }
        entries.insert(key, expanded.clone());

        expanded
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
