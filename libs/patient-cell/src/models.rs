use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::clinic::{Appointment, Patient};
use shared_models::error::AppError;
use shared_utils::validation::{FieldValue, Validate, ValidationErrors};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl Validate for RegisterPatientRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(self.name.as_deref()),
            "email" => FieldValue::Text(self.email.as_deref()),
            "date_of_birth" => FieldValue::Selected(self.date_of_birth.is_some()),
            "gender" => FieldValue::Text(self.gender.as_deref()),
            "phone" => FieldValue::Text(self.phone.as_deref()),
            _ => FieldValue::Text(None),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePatientRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl Validate for UpdatePatientRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(self.name.as_deref()),
            "email" => FieldValue::Text(self.email.as_deref()),
            "gender" => FieldValue::Text(self.gender.as_deref()),
            "phone" => FieldValue::Text(self.phone.as_deref()),
            _ => FieldValue::Text(None),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientDashboard {
    pub patient: Patient,
    /// Soonest first.
    pub upcoming: Vec<Appointment>,
    /// Most recent first.
    pub past: Vec<Appointment>,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient not found: {0}")]
    NotFound(Uuid),

    #[error("Patient with email {0} already exists")]
    EmailTaken(String),

    #[error("Patient profile {0} already exists")]
    AlreadyRegistered(Uuid),

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(error: PatientError) -> Self {
        match error {
            PatientError::NotFound(_) => AppError::NotFound("Patient not found".to_string()),
            PatientError::EmailTaken(_) | PatientError::AlreadyRegistered(_) => {
                AppError::Conflict(error.to_string())
            }
            PatientError::Validation(e) => AppError::ValidationError(e.to_string()),
            PatientError::Store(e) => e.into(),
        }
    }
}
