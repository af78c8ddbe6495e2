use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_models::clinic::{
    Appointment, AppointmentChanges, AppointmentFilter, Doctor, Notification, Patient, Rating,
    UnavailabilityEntry,
};
use shared_models::error::AppError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A conditional write found the row no longer in the expected state.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound { entity, id: id.to_string() }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { entity, .. } => AppError::NotFound(format!("{} not found", entity)),
            StoreError::UniqueViolation(msg) | StoreError::PreconditionFailed(msg) => AppError::Conflict(msg),
            StoreError::Backend(msg) => AppError::Database(msg),
            StoreError::Serialization(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Keyed persistence for the clinic records.
///
/// Every implementation enforces the same uniqueness constraints, reported as
/// [`StoreError::UniqueViolation`]:
/// - appointments: one non-cancelled row per (doctor, date, time slot);
/// - ratings: one row per appointment;
/// - patients: one row per email, compared case-insensitively;
/// - unavailability: one row per (doctor, date), `upsert_unavailability` replaces it.
///
/// Appointment writes touch only the columns they name, so concurrent writers
/// of other columns are not overwritten.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    async fn get_doctor(&self, id: Uuid) -> StoreResult<Doctor>;
    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>>;
    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor>;
    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor>;

    async fn get_patient(&self, id: Uuid) -> StoreResult<Patient>;
    async fn find_patient_by_email(&self, email: &str) -> StoreResult<Option<Patient>>;
    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient>;
    async fn update_patient(&self, patient: Patient) -> StoreResult<Patient>;

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Appointment>;
    async fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;
    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
    async fn patch_appointment(&self, id: Uuid, changes: &AppointmentChanges) -> StoreResult<Appointment>;
    /// Sets `rating_id` on a Completed, not yet rated appointment; any other
    /// state fails with `PreconditionFailed`.
    async fn link_rating(&self, appointment_id: Uuid, rating_id: Uuid) -> StoreResult<Appointment>;

    async fn get_unavailability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<UnavailabilityEntry>>;
    async fn list_unavailability(&self, doctor_id: Uuid) -> StoreResult<Vec<UnavailabilityEntry>>;
    async fn upsert_unavailability(&self, entry: UnavailabilityEntry) -> StoreResult<UnavailabilityEntry>;

    async fn insert_rating(&self, rating: Rating) -> StoreResult<Rating>;
    async fn list_ratings_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Rating>>;
    async fn find_rating_for_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Rating>>;
    async fn delete_rating(&self, id: Uuid) -> StoreResult<()>;

    async fn get_notification(&self, id: Uuid) -> StoreResult<Notification>;
    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification>;
    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<Notification>>;
    async fn update_notification(&self, notification: Notification) -> StoreResult<Notification>;
}
