use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::{Appointment, Doctor, Patient, Rating, UnavailabilityEntry};
use shared_models::error::AppError;
use shared_utils::validation::{FieldValue, Validate, ValidationErrors};

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorSearchFilters {
    /// Case-insensitive substring of the doctor's name.
    pub name: Option<String>,
    /// Exact specialty; "All" disables the filter.
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: Option<NaiveDate>,
    /// Appointment being rescheduled; its own slot is reported as free.
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetUnavailableRequest {
    pub dates: Vec<NaiveDate>,
    /// Empty blocks the whole day.
    #[serde(default)]
    pub times: Vec<String>,
}

/// Profile created at doctor signup; the account id comes from the token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub consultation_fee: Option<f64>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl Validate for RegisterDoctorRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(self.name.as_deref()),
            "specialty" => FieldValue::Text(self.specialty.as_deref()),
            "consultation_fee" => FieldValue::Number(self.consultation_fee),
            "bio" => FieldValue::Text(self.bio.as_deref()),
            _ => FieldValue::Text(None),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub consultation_fee: Option<f64>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl Validate for UpdateDoctorRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(self.name.as_deref()),
            "specialty" => FieldValue::Text(self.specialty.as_deref()),
            "consultation_fee" => FieldValue::Number(self.consultation_fee),
            "bio" => FieldValue::Text(self.bio.as_deref()),
            _ => FieldValue::Text(None),
        }
    }
}

// ==============================================================================
// RESPONSES
// ==============================================================================

/// Doctor as listed in search results, with display defaults applied.
#[derive(Debug, Clone, Serialize)]
pub struct DoctorCard {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub avatar_url: String,
    pub consultation_fee: f64,
    pub fee_label: String,
}

impl From<&Doctor> for DoctorCard {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name.clone(),
            specialty: doctor.specialty.clone(),
            avatar_url: doctor.avatar_or_default(),
            consultation_fee: doctor.consultation_fee,
            fee_label: doctor.fee_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorProfile {
    #[serde(flatten)]
    pub card: DoctorCard,
    pub bio: String,
    pub unavailability: Vec<UnavailabilityEntry>,
    pub ratings: Vec<Rating>,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub upcoming: usize,
    pub completed: usize,
    pub cancelled: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub appointments: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorDashboard {
    pub doctor_id: Uuid,
    pub today: NaiveDate,
    pub todays_appointments: Vec<Appointment>,
    pub patients: Vec<Patient>,
    pub status_counts: StatusCounts,
    /// Oldest first, ending with `today`.
    pub weekly_appointments: Vec<DailyCount>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(Uuid),

    #[error("{0} is not a bookable time slot")]
    UnknownTimeSlot(String),

    #[error("Select at least one date")]
    NoDates,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(Uuid),

    #[error("Doctor profile {0} already exists")]
    AlreadyRegistered(Uuid),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AvailabilityError> for AppError {
    fn from(error: AvailabilityError) -> Self {
        match error {
            AvailabilityError::DoctorNotFound(_) => AppError::NotFound("Doctor not found".to_string()),
            AvailabilityError::UnknownTimeSlot(_) | AvailabilityError::NoDates => {
                AppError::ValidationError(error.to_string())
            }
            AvailabilityError::Store(e) => e.into(),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(error: DoctorError) -> Self {
        match error {
            DoctorError::NotFound(_) => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::AlreadyRegistered(_) => AppError::Conflict(error.to_string()),
            DoctorError::Validation(e) => AppError::ValidationError(e.to_string()),
            DoctorError::Store(e) => e.into(),
        }
    }
}
