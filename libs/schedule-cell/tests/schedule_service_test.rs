mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Weekday;
use uuid::Uuid;

use schedule_cell::models::{BlockKind, DateRange};
use schedule_cell::services::{ExpansionCache, InMemoryScheduleStore, ScheduleService, ScheduleStore};
use shared_models::error::BookingError;

use common::{at, date, one_off, weekly};

fn service() -> (Arc<InMemoryScheduleStore>, ScheduleService) {
    let store = Arc::new(InMemoryScheduleStore::new());
    let service = ScheduleService::new(store.clone());
    (store, service)
}

#[tokio::test]
async fn overlapping_work_blocks_are_rejected_across_locations() {
    let (_, service) = service();
    let provider = Uuid::new_v4();

    service
        .save_block(weekly(provider, Uuid::new_v4(), Weekday::Mon, (9, 0), (12, 0), 0, (date(1), None)))
        .await
        .unwrap();

    let clash = one_off(provider, Uuid::new_v4(), BlockKind::Work, at(14, 11, 30), at(14, 13, 0), 30, 0);
    assert_matches!(service.save_block(clash).await, Err(BookingError::InvalidSchedule(_)));

    // Same time, different provider is fine
    let other = one_off(Uuid::new_v4(), Uuid::new_v4(), BlockKind::Work, at(14, 11, 30), at(14, 13, 0), 30, 0);
    assert!(service.save_block(other).await.is_ok());
}

#[tokio::test]
async fn breaks_may_overlap_work() {
    let (_, service) = service();
    let (provider, location) = (Uuid::new_v4(), Uuid::new_v4());

    service
        .save_block(one_off(provider, location, BlockKind::Work, at(7, 9, 0), at(7, 12, 0), 30, 0))
        .await
        .unwrap();
    service
        .save_block(one_off(provider, location, BlockKind::Break, at(7, 11, 0), at(7, 13, 0), 0, 0))
        .await
        .unwrap();

    assert_eq!(service.list_blocks(provider).await.unwrap().len(), 2);
}

#[tokio::test]
async fn resaving_a_block_does_not_conflict_with_itself() {
    let (_, service) = service();
    let (provider, location) = (Uuid::new_v4(), Uuid::new_v4());

    let mut block = one_off(provider, location, BlockKind::Work, at(7, 9, 0), at(7, 12, 0), 30, 0);
    let saved = service.save_block(block.clone()).await.unwrap();

    block.timing = schedule_cell::models::BlockTiming::OneOff {
        start_ts: at(7, 10, 0),
        end_ts: at(7, 12, 0),
    };
    let resaved = service.save_block(block).await.unwrap();

    assert_eq!(resaved.id, saved.id);
    assert!(resaved.updated_at >= saved.updated_at);
    assert_eq!(service.list_blocks(provider).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_unknown_block_is_not_found() {
    let (_, service) = service();
    let (provider, location) = (Uuid::new_v4(), Uuid::new_v4());

    let saved = service
        .save_block(one_off(provider, location, BlockKind::Work, at(7, 9, 0), at(7, 10, 0), 30, 0))
        .await
        .unwrap();

    assert_matches!(
        service.delete_block(Uuid::new_v4(), saved.id).await,
        Err(BookingError::NotFound(_))
    );
    service.delete_block(provider, saved.id).await.unwrap();
    assert_matches!(service.get_block(provider, saved.id).await, Err(BookingError::NotFound(_)));
}

#[tokio::test]
async fn slot_plan_is_idempotent_and_scoped_to_location() {
    let (_, service) = service();
    let (provider, location) = (Uuid::new_v4(), Uuid::new_v4());

    service
        .save_block(weekly(provider, location, Weekday::Mon, (9, 0), (12, 0), 0, (date(1), None)))
        .await
        .unwrap();
    service
        .save_block(weekly(provider, Uuid::new_v4(), Weekday::Tue, (9, 0), (12, 0), 0, (date(1), None)))
        .await
        .unwrap();

    let window = DateRange::new(date(7), date(13), 90).unwrap().window();
    let first: Vec<_> = service.slot_plan(provider, location, window, vec![]).await.unwrap().iter().collect();
    let second: Vec<_> = service.slot_plan(provider, location, window, vec![]).await.unwrap().iter().collect();

    assert_eq!(first.len(), 6);
    assert_eq!(first, second);
    assert!(first.iter().all(|s| s.location_id == location));

    assert!(service.produces_slot(provider, location, at(7, 9, 30), at(7, 10, 0)).await.unwrap());
    assert!(!service.produces_slot(provider, location, at(7, 9, 15), at(7, 9, 45)).await.unwrap());
}

#[tokio::test]
async fn edited_blocks_miss_the_expansion_cache() {
    let store = Arc::new(InMemoryScheduleStore::new());
    let service = ScheduleService::with_cache(store.clone(), ExpansionCache::with_capacity(8));
    let (provider, location) = (Uuid::new_v4(), Uuid::new_v4());

    let mut block = store
        .save_block(weekly(provider, location, Weekday::Mon, (9, 0), (10, 0), 0, (date(1), None)))
        .await
        .unwrap();
    let window = DateRange::new(date(7), date(7), 90).unwrap().window();

    assert_eq!(service.slot_plan(provider, location, window, vec![]).await.unwrap().iter().count(), 2);

    block.slot_duration_minutes = 60;
    store.save_block(block).await.unwrap();

    assert_eq!(service.slot_plan(provider, location, window, vec![]).await.unwrap().iter().count(), 1);
}

#[tokio::test]
async fn expansion_cache_is_bounded() {
    let cache = ExpansionCache::with_capacity(2);
    let block = weekly(Uuid::new_v4(), Uuid::new_v4(), Weekday::Mon, (9, 0), (10, 0), 0, (date(1), None));

    for day in 1..=5 {
        let window = DateRange::new(date(day), date(day), 90).unwrap().window();
        cache.expand(&block, window).await;
    }

    assert!(cache.len().await <= 2);
}
