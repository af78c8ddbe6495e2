use std::cmp::Reverse;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::slots::catalog_position;
use shared_database::{ChangeFeed, ClinicStore, StoreError};
use shared_models::clinic::{Appointment, AppointmentFilter, AppointmentStatus, Patient};
use shared_models::events::{RecordChange, Table};
use shared_utils::validation::{rules, validate};

use crate::models::{PatientDashboard, PatientError, RegisterPatientRequest, UpdatePatientRequest};

/// Splits appointments into upcoming (soonest first) and the rest (latest first).
pub fn split_appointments(appointments: Vec<Appointment>) -> (Vec<Appointment>, Vec<Appointment>) {
    let (mut upcoming, mut past): (Vec<_>, Vec<_>) = appointments
        .into_iter()
        .partition(|a| a.status == AppointmentStatus::Upcoming);

    upcoming.sort_by_key(|a| (a.date, catalog_position(&a.time_slot)));
    past.sort_by_key(|a| Reverse((a.date, catalog_position(&a.time_slot))));
    (upcoming, past)
}

pub struct PatientService {
    store: Arc<dyn ClinicStore>,
    feed: ChangeFeed,
}

impl PatientService {
    pub fn new(store: Arc<dyn ClinicStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    /// Creates the profile row for an authenticated account.
    pub async fn register_patient(
        &self,
        patient_id: Uuid,
        request: RegisterPatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Registering patient profile {}", patient_id);

        validate(&request, rules::PATIENT_REGISTRATION)?;
        validate(&request, rules::PATIENT_PROFILE)?;

        match self.store.get_patient(patient_id).await {
            Ok(_) => return Err(PatientError::AlreadyRegistered(patient_id)),
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let email = request.email.unwrap_or_default().trim().to_string();
        if self.store.find_patient_by_email(&email).await?.is_some() {
            return Err(PatientError::EmailTaken(email));
        }

        let patient = Patient {
            id: patient_id,
            name: request.name.unwrap_or_default().trim().to_string(),
            email: email.clone(),
            date_of_birth: request.date_of_birth.unwrap_or_default(),
            gender: request.gender.unwrap_or_default(),
            phone: request.phone.unwrap_or_default(),
            avatar_url: request.avatar_url.filter(|a| !a.trim().is_empty()),
        };

        let saved = match self.store.insert_patient(patient).await {
            Ok(saved) => saved,
            Err(StoreError::UniqueViolation(_)) => return Err(PatientError::EmailTaken(email)),
            Err(e) => return Err(e.into()),
        };
        self.feed.publish(RecordChange::inserted(Table::Patients, saved.id));

        info!("Patient {} registered", saved.id);
        Ok(saved)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        match self.store.get_patient(patient_id).await {
            Ok(patient) => Ok(patient),
            Err(StoreError::NotFound { .. }) => Err(PatientError::NotFound(patient_id)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient profile {}", patient_id);
        validate(&request, rules::PATIENT_PROFILE)?;

        let mut patient = self.get_patient(patient_id).await?;

        if let Some(email) = request.email.map(|e| e.trim().to_string()) {
            if !email.eq_ignore_ascii_case(&patient.email) {
                if let Some(owner) = self.store.find_patient_by_email(&email).await? {
                    if owner.id != patient_id {
                        return Err(PatientError::EmailTaken(email));
                    }
                }
            }
            patient.email = email;
        }
        if let Some(name) = request.name {
            patient.name = name.trim().to_string();
        }
        if let Some(date_of_birth) = request.date_of_birth {
            patient.date_of_birth = date_of_birth;
        }
        if let Some(gender) = request.gender {
            patient.gender = gender;
        }
        if let Some(phone) = request.phone {
            patient.phone = phone;
        }
        if let Some(avatar_url) = request.avatar_url {
            patient.avatar_url = Some(avatar_url).filter(|a| !a.trim().is_empty());
        }

        let email = patient.email.clone();
        let updated = match self.store.update_patient(patient).await {
            Ok(updated) => updated,
            Err(StoreError::UniqueViolation(_)) => {
                warn!("Email {} claimed concurrently", email);
                return Err(PatientError::EmailTaken(email));
            }
            Err(e) => return Err(e.into()),
        };
        self.feed.publish(RecordChange::updated(Table::Patients, updated.id));

        Ok(updated)
    }

    pub async fn dashboard(&self, patient_id: Uuid) -> Result<PatientDashboard, PatientError> {
        debug!("Building dashboard for patient {}", patient_id);

        let patient = self.get_patient(patient_id).await?;
        let appointments = self
            .store
            .list_appointments(&AppointmentFilter::for_patient(patient_id))
            .await?;
        let (upcoming, past) = split_appointments(appointments);

        Ok(PatientDashboard { patient, upcoming, past })
    }
}
