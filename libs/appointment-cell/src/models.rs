// libs/appointment-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::models::AvailabilityError;
use shared_database::StoreError;
use shared_models::clinic::{AppointmentStatus, ConsultationType};
use shared_models::error::AppError;
use shared_utils::validation::{FieldValue, Validate, ValidationErrors};

// ==============================================================================
// REQUESTS
// ==============================================================================

fn default_consultation_type() -> ConsultationType {
    ConsultationType::InPerson
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    #[serde(default = "default_consultation_type")]
    pub consultation_type: ConsultationType,
    pub notes: Option<String>,
}

impl Validate for BookAppointmentRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "doctor" => FieldValue::Selected(self.doctor_id.is_some()),
            "date" => FieldValue::Selected(self.date.is_some()),
            "time" => FieldValue::Text(self.time_slot.as_deref()),
            "notes" => FieldValue::Text(self.notes.as_deref()),
            _ => FieldValue::Text(None),
        }
    }
}

/// New placement for an existing appointment. Omitted fields keep their
/// current values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub doctor_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub consultation_type: Option<ConsultationType>,
    pub notes: Option<String>,
}

impl Validate for RescheduleAppointmentRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            // Defaults to the appointment's current doctor.
            "doctor" => FieldValue::Selected(true),
            "date" => FieldValue::Selected(self.date.is_some()),
            "time" => FieldValue::Text(self.time_slot.as_deref()),
            "notes" => FieldValue::Text(self.notes.as_deref()),
            _ => FieldValue::Text(None),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddRatingRequest {
    /// Must match the appointment's doctor when given.
    pub doctor_id: Option<Uuid>,
    pub score: Option<i64>,
    #[serde(default)]
    pub feedback: String,
}

impl Validate for AddRatingRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "score" => FieldValue::Int(self.score),
            "feedback" => FieldValue::Text(Some(self.feedback.as_str())),
            _ => FieldValue::Text(None),
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("{time_slot} on {date} is no longer available")]
    SlotUnavailable {
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: String,
    },

    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(Uuid),

    #[error("Patient not found: {0}")]
    PatientNotFound(Uuid),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("Appointment {0} has already been rated")]
    DuplicateRating(Uuid),

    #[error("{0}")]
    InvalidRatingTarget(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppointmentError {
    pub fn slot_unavailable(doctor_id: Uuid, date: NaiveDate, time_slot: &str) -> Self {
        AppointmentError::SlotUnavailable {
            doctor_id,
            date,
            time_slot: time_slot.to_string(),
        }
    }
}

impl From<AvailabilityError> for AppointmentError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::DoctorNotFound(id) => AppointmentError::DoctorNotFound(id),
            AvailabilityError::Store(e) => AppointmentError::Store(e),
            other => AppointmentError::Store(StoreError::Backend(other.to_string())),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::SlotUnavailable { .. } | AppointmentError::DuplicateRating(_) => {
                AppError::Conflict(error.to_string())
            }
            AppointmentError::NotFound(_) => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::DoctorNotFound(_) => AppError::NotFound("Doctor not found".to_string()),
            AppointmentError::PatientNotFound(_) => AppError::NotFound("Patient not found".to_string()),
            AppointmentError::Validation(_) | AppointmentError::InvalidRatingTarget(_) => {
                AppError::ValidationError(error.to_string())
            }
            AppointmentError::Store(e) => e.into(),
        }
    }
}
