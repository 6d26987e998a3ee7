mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus, VisitType};
use appointment_cell::services::{AppointmentLifecycleService, AppointmentRepository, InMemoryAppointmentRepository};
use shared_models::error::BookingError;

use common::{ContestedAppointmentRepository, Harness};

async fn confirmed(h: &Harness, hour: u32) -> Appointment {
    let hold = h.state.booking.place_hold(h.slot(hour, 0), Uuid::new_v4()).await.unwrap();
    h.state
        .booking
        .confirm(&hold.hold_id, Uuid::new_v4(), VisitType::GeneralConsultation, None)
        .await
        .unwrap()
}

#[test]
fn transition_table() {
    use AppointmentStatus::*;
    let lifecycle = AppointmentLifecycleService::new();

    let allowed = [(Confirmed, Started), (Started, Completed), (Confirmed, Cancelled), (Confirmed, Rescheduled)];

    for from in AppointmentStatus::ALL {
        for to in AppointmentStatus::ALL {
            let result = lifecycle.validate_status_transition(from, to);
            if allowed.contains(&(from, to)) {
                assert!(result.is_ok(), "{} -> {} should be allowed", from, to);
            } else {
                assert_matches!(result, Err(BookingError::IllegalTransition { .. }), "{} -> {}", from, to);
            }
        }
    }
}

#[tokio::test]
async fn appointment_runs_through_its_lifecycle() {
    let h = Harness::new(120).await;
    let booking = &h.state.booking;
    let appointment = confirmed(&h, 9).await;

    let started = booking.transition(appointment.id, AppointmentStatus::Started).await.unwrap();
    assert_eq!(started.status, AppointmentStatus::Started);

    let completed = booking.transition(appointment.id, AppointmentStatus::Completed).await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let err = booking.transition(appointment.id, AppointmentStatus::Cancelled).await.unwrap_err();
    assert_eq!(
        err,
        BookingError::IllegalTransition {
            from: "completed".to_string(),
            to: "cancelled".to_string()
        }
    );
    assert_eq!(
        booking.get_appointment(appointment.id).await.unwrap().status,
        AppointmentStatus::Completed
    );
}

#[tokio::test]
async fn cancellation_frees_the_slot() {
    let h = Harness::new(120).await;
    let appointment = confirmed(&h, 10).await;

    h.state
        .booking
        .transition(appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();

    let slots = h
        .state
        .availability
        .compute_availability(h.provider_id, h.location_id, h.day, h.day)
        .await
        .unwrap();
    assert!(slots.iter().any(|s| s.start_ts == h.at(10, 0)));
    assert!(h.state.booking.place_hold(h.slot(10, 0), Uuid::new_v4()).await.is_ok());
}

#[tokio::test]
async fn rescheduled_is_not_a_direct_target() {
    let h = Harness::new(120).await;
    let appointment = confirmed(&h, 9).await;

    assert_matches!(
        h.state.booking.transition(appointment.id, AppointmentStatus::Rescheduled).await,
        Err(BookingError::InvalidRequest(_))
    );
    assert_matches!(
        h.state.booking.transition(Uuid::new_v4(), AppointmentStatus::Started).await,
        Err(BookingError::NotFound(_))
    );
}

#[tokio::test]
async fn concurrent_transitions_apply_once() {
    let h = Harness::new(120).await;
    let appointment = confirmed(&h, 9).await;

    let (start, cancel) = tokio::join!(
        h.state.booking.transition(appointment.id, AppointmentStatus::Started),
        h.state.booking.transition(appointment.id, AppointmentStatus::Cancelled)
    );

    assert_eq!([start.is_ok(), cancel.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let loser = if start.is_ok() { cancel } else { start };
    assert_matches!(loser, Err(BookingError::IllegalTransition { .. }));
}

#[tokio::test]
async fn reschedule_moves_the_booking_to_a_new_slot() {
    let h = Harness::new(120).await;
    let booking = &h.state.booking;
    let original = confirmed(&h, 9).await;

    let new_hold = booking.place_hold(h.slot(11, 0), Uuid::new_v4()).await.unwrap();
    let outcome = booking.reschedule(original.id, &new_hold.hold_id).await.unwrap();

    assert_eq!(outcome.previous.id, original.id);
    assert_eq!(outcome.previous.status, AppointmentStatus::Rescheduled);
    assert_eq!(outcome.replacement.status, AppointmentStatus::Confirmed);
    assert_eq!(outcome.replacement.rescheduled_from, Some(original.id));
    assert_eq!(outcome.replacement.patient_id, original.patient_id);
    assert_eq!(outcome.replacement.visit_type, original.visit_type);
    assert_eq!(outcome.replacement.start_ts, h.at(11, 0));

    // The old slot is bookable again
    assert!(booking.place_hold(h.slot(9, 0), Uuid::new_v4()).await.is_ok());
}

#[tokio::test]
async fn reschedule_requires_a_confirmed_appointment_and_live_hold() {
    let h = Harness::new(120).await;
    let booking = &h.state.booking;
    let appointment = confirmed(&h, 9).await;

    let expired = hold_cell::models::HoldId::mint(&h.slot(11, 0).slot_key());
    assert_matches!(booking.reschedule(appointment.id, &expired).await, Err(BookingError::HoldExpired));
    assert_eq!(
        booking.get_appointment(appointment.id).await.unwrap().status,
        AppointmentStatus::Confirmed
    );

    booking.transition(appointment.id, AppointmentStatus::Cancelled).await.unwrap();
    let hold = booking.place_hold(h.slot(11, 0), Uuid::new_v4()).await.unwrap();

    assert_matches!(
        booking.reschedule(appointment.id, &hold.hold_id).await,
        Err(BookingError::IllegalTransition { .. })
    );
    // The hold was not consumed
    assert!(booking.get_hold(&hold.hold_id).await.is_ok());
}

#[tokio::test]
async fn reschedule_losing_the_final_transition_cancels_the_replacement() {
    let inner = Arc::new(InMemoryAppointmentRepository::new());
    let repository = Arc::new(ContestedAppointmentRepository::new(inner.clone()));
    let h = Harness::with_repository(repository.clone(), inner).await;
    let booking = &h.state.booking;

    let original = confirmed(&h, 9).await;
    let new_hold = booking.place_hold(h.slot(11, 0), Uuid::new_v4()).await.unwrap();
    repository.contest(original.id);

    let result = booking.reschedule(original.id, &new_hold.hold_id).await;
    assert_matches!(
        result,
        Err(BookingError::IllegalTransition { ref from, ref to }) if from == "cancelled" && to == "rescheduled"
    );

    let inserted = repository.inserted();
    assert_eq!(inserted.len(), 2);
    let replacement = booking.get_appointment(inserted[1]).await.unwrap();
    assert_eq!(replacement.rescheduled_from, Some(original.id));
    assert_eq!(replacement.status, AppointmentStatus::Cancelled);

    // The replacement's slot is free again
    let booked = h
        .appointments
        .find_active_in_range(h.provider_id, h.location_id, h.at(11, 0), h.at(11, 30))
        .await
        .unwrap();
    assert!(booked.is_empty());
    assert!(booking.place_hold(h.slot(11, 0), Uuid::new_v4()).await.is_ok());
}
