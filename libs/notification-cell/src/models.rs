use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::{AppointmentStatus, UserType};
use shared_models::error::AppError;

pub const DOCTOR_DASHBOARD_LINK: &str = "/doctor/dashboard";
pub const PATIENT_DASHBOARD_LINK: &str = "/patient/dashboard";

/// Notification about to be stored for one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDraft {
    pub user_id: Uuid,
    pub user_type: UserType,
    pub message: String,
    pub link: String,
}

impl NotificationDraft {
    pub fn appointment_booked(doctor_id: Uuid, patient_name: &str, date: NaiveDate, time_slot: &str) -> Self {
        Self {
            user_id: doctor_id,
            user_type: UserType::Doctor,
            message: format!(
                "New appointment booked by {} on {} at {}",
                patient_name,
                date.format("%B %-d, %Y"),
                time_slot
            ),
            link: DOCTOR_DASHBOARD_LINK.to_string(),
        }
    }

    pub fn appointment_rescheduled(doctor_id: Uuid, patient_name: &str, date: NaiveDate, time_slot: &str) -> Self {
        Self {
            user_id: doctor_id,
            user_type: UserType::Doctor,
            message: format!(
                "{} rescheduled their appointment to {} at {}",
                patient_name,
                date.format("%B %-d, %Y"),
                time_slot
            ),
            link: DOCTOR_DASHBOARD_LINK.to_string(),
        }
    }

    pub fn status_changed(patient_id: Uuid, doctor_name: &str, date: NaiveDate, status: AppointmentStatus) -> Self {
        Self {
            user_id: patient_id,
            user_type: UserType::Patient,
            message: format!(
                "Your appointment with {} on {} is now {}",
                doctor_name,
                date.format("%B %-d, %Y"),
                status
            ),
            link: PATIENT_DASHBOARD_LINK.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<NotificationError> for AppError {
    fn from(error: NotificationError) -> Self {
        match error {
            NotificationError::NotFound(_) => AppError::NotFound("Notification not found".to_string()),
            NotificationError::Store(e) => e.into(),
        }
    }
}
