// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

use hold_cell::models::{Hold, HoldId};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub location_id: Uuid,
    pub patient_id: Uuid,
    pub start_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub visit_type: VisitType,
    pub created_from_hold_id: HoldId,
    pub rescheduled_from: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// A freshly confirmed appointment for the slot a hold covers.
    pub fn confirmed_from_hold(
        hold: &Hold,
        patient_id: Uuid,
        visit_type: VisitType,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            provider_id: hold.provider_id,
            location_id: hold.location_id,
            patient_id,
            start_ts: hold.start_ts,
            end_ts: hold.end_ts,
            status: AppointmentStatus::Confirmed,
            visit_type,
            created_from_hold_id: hold.hold_id.clone(),
            rescheduled_from: None,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn overlaps(&self, start_ts: DateTime<Utc>, end_ts: DateTime<Utc>) -> bool {
        self.start_ts < end_ts && start_ts < self.end_ts
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Started,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Confirmed,
        AppointmentStatus::Started,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Rescheduled,
    ];

    /// Statuses under which the appointment still owns its time range.
    pub fn occupies_slot(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Confirmed | AppointmentStatus::Started | AppointmentStatus::Completed
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::Rescheduled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Started => "started",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VisitType {
    #[serde(alias = "InitialConsultation", alias = "initial", alias = "new_patient")]
    InitialConsultation,

    #[serde(alias = "FollowUp", alias = "follow_up_consultation", alias = "followup")]
    FollowUp,

    #[serde(alias = "Urgent", alias = "emergency")]
    Urgent,

    #[serde(alias = "TelehealthCheckIn", alias = "telehealth", alias = "virtual")]
    TelehealthCheckIn,

    #[serde(alias = "PrescriptionRenewal", alias = "prescription")]
    PrescriptionRenewal,

    #[serde(alias = "Procedure")]
    Procedure,

    #[serde(alias = "GeneralConsultation", alias = "consultation", alias = "general")]
    GeneralConsultation,
}

impl fmt::Display for VisitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitType::InitialConsultation => write!(f, "initial_consultation"),
            VisitType::FollowUp => write!(f, "follow_up"),
            VisitType::Urgent => write!(f, "urgent"),
            VisitType::TelehealthCheckIn => write!(f, "telehealth_check_in"),
            VisitType::PrescriptionRenewal => write!(f, "prescription_renewal"),
            VisitType::Procedure => write!(f, "procedure"),
            VisitType::GeneralConsultation => write!(f, "general_consultation"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmBookingRequest {
    pub hold_id: HoldId,
    pub patient_id: Uuid,
    pub visit_type: VisitType,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub target_state: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub hold_id: HoldId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RescheduleOutcome {
    pub previous: Appointment,
    pub replacement: Appointment,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldGranted {
    pub hold_id: HoldId,
    pub expires_at: DateTime<Utc>,
}

impl From<&Hold> for HoldGranted {
    fn from(hold: &Hold) -> Self {
        Self {
            hold_id: hold.hold_id.clone(),
            expires_at: hold.expires_at(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub from: chrono::NaiveDate,
    pub to: chrono::NaiveDate,
}
