use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{ChangeFeed, ClinicStore, StoreError};
use shared_models::clinic::{AppointmentFilter, AppointmentStatus, Doctor, Rating};
use shared_models::events::{RecordChange, Table};
use shared_utils::validation::{rules, validate};

use crate::models::{
    DailyCount, DoctorCard, DoctorDashboard, DoctorError, DoctorProfile, DoctorSearchFilters,
    RegisterDoctorRequest, StatusCounts, UpdateDoctorRequest,
};
use crate::services::slots::catalog_position;

const ALL_SPECIALTIES: &str = "All";

/// Mean score rounded to one decimal; `None` when unrated.
pub fn average_rating(ratings: &[Rating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let total: u32 = ratings.iter().map(|r| u32::from(r.score)).sum();
    let mean = f64::from(total) / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

pub struct DoctorService {
    store: Arc<dyn ClinicStore>,
    feed: ChangeFeed,
}

impl DoctorService {
    pub fn new(store: Arc<dyn ClinicStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        match self.store.get_doctor(doctor_id).await {
            Ok(doctor) => Ok(doctor),
            Err(StoreError::NotFound { .. }) => Err(DoctorError::NotFound(doctor_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the doctor row for an authenticated account. Without a fee the
    /// doctor is listed as free.
    pub async fn register_doctor(
        &self,
        doctor_id: Uuid,
        request: RegisterDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Registering doctor profile {}", doctor_id);

        validate(&request, rules::DOCTOR_REGISTRATION)?;
        validate(&request, rules::DOCTOR_PROFILE)?;

        match self.store.get_doctor(doctor_id).await {
            Ok(_) => return Err(DoctorError::AlreadyRegistered(doctor_id)),
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let doctor = Doctor {
            id: doctor_id,
            name: request.name.unwrap_or_default().trim().to_string(),
            specialty: request.specialty.unwrap_or_default().trim().to_string(),
            consultation_fee: request.consultation_fee.unwrap_or(0.0),
            bio: request.bio.filter(|b| !b.trim().is_empty()),
            avatar_url: request.avatar_url.filter(|a| !a.trim().is_empty()),
        };

        let saved = match self.store.insert_doctor(doctor).await {
            Ok(saved) => saved,
            Err(StoreError::UniqueViolation(detail)) => {
                warn!("Doctor {} registered concurrently: {}", doctor_id, detail);
                return Err(DoctorError::AlreadyRegistered(doctor_id));
            }
            Err(e) => return Err(e.into()),
        };
        self.feed.publish(RecordChange::inserted(Table::Doctors, saved.id));

        info!("Doctor {} registered as {}", saved.id, saved.specialty);
        Ok(saved)
    }

    /// Doctor with blocked dates, ratings and display defaults.
    pub async fn get_profile(&self, doctor_id: Uuid) -> Result<DoctorProfile, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        let doctor = self.get_doctor(doctor_id).await?;
        let unavailability = self.store.list_unavailability(doctor_id).await?;
        let ratings = self.store.list_ratings_for_doctor(doctor_id).await?;

        Ok(DoctorProfile {
            card: DoctorCard::from(&doctor),
            bio: doctor.bio_or_default().to_string(),
            average_rating: average_rating(&ratings),
            unavailability,
            ratings,
        })
    }

    pub async fn search_doctors(&self, filters: DoctorSearchFilters) -> Result<Vec<DoctorCard>, DoctorError> {
        debug!("Searching doctors with filters: {:?}", filters);

        let name = filters
            .name
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty());
        let specialty = filters
            .specialty
            .filter(|s| !s.is_empty() && s != ALL_SPECIALTIES);

        let doctors = self.store.list_doctors().await?;
        Ok(doctors
            .iter()
            .filter(|d| name.as_ref().map_or(true, |n| d.name.to_lowercase().contains(n)))
            .filter(|d| specialty.as_ref().map_or(true, |s| &d.specialty == s))
            .map(DoctorCard::from)
            .collect())
    }

    /// Distinct specialties, alphabetical.
    pub async fn list_specialties(&self) -> Result<Vec<String>, DoctorError> {
        let doctors = self.store.list_doctors().await?;
        let specialties: BTreeSet<String> = doctors.into_iter().map(|d| d.specialty).collect();
        Ok(specialties.into_iter().collect())
    }

    /// Partial profile update. Appointments keep the name, specialty and fee
    /// they were booked with.
    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);
        validate(&request, rules::DOCTOR_PROFILE)?;

        let mut doctor = self.get_doctor(doctor_id).await?;
        if let Some(name) = request.name {
            doctor.name = name.trim().to_string();
        }
        if let Some(specialty) = request.specialty {
            doctor.specialty = specialty;
        }
        if let Some(fee) = request.consultation_fee {
            doctor.consultation_fee = fee;
        }
        if let Some(bio) = request.bio {
            doctor.bio = Some(bio).filter(|b| !b.trim().is_empty());
        }
        if let Some(avatar_url) = request.avatar_url {
            doctor.avatar_url = Some(avatar_url).filter(|a| !a.trim().is_empty());
        }

        let updated = self.store.update_doctor(doctor).await?;
        self.feed.publish(RecordChange::updated(Table::Doctors, updated.id));

        info!("Doctor profile {} updated", updated.id);
        Ok(updated)
    }

    pub async fn dashboard(&self, doctor_id: Uuid, today: NaiveDate) -> Result<DoctorDashboard, DoctorError> {
        debug!("Building dashboard for doctor {} on {}", doctor_id, today);
        self.get_doctor(doctor_id).await?;

        let appointments = self
            .store
            .list_appointments(&AppointmentFilter::for_doctor(doctor_id))
            .await?;

        let mut todays_appointments: Vec<_> = appointments
            .iter()
            .filter(|a| a.date == today)
            .cloned()
            .collect();
        todays_appointments.sort_by_key(|a| catalog_position(&a.time_slot));

        let mut status_counts = StatusCounts::default();
        for appointment in &appointments {
            match appointment.status {
                AppointmentStatus::Upcoming => status_counts.upcoming += 1,
                AppointmentStatus::Completed => status_counts.completed += 1,
                AppointmentStatus::Cancelled => status_counts.cancelled += 1,
            }
        }

        let week_start = today - Duration::days(6);
        let mut per_day: HashMap<NaiveDate, usize> = HashMap::new();
        for appointment in appointments.iter().filter(|a| a.date >= week_start && a.date <= today) {
            *per_day.entry(appointment.date).or_default() += 1;
        }
        let weekly_appointments = (0..7)
            .map(|offset| {
                let date = week_start + Duration::days(offset);
                DailyCount {
                    date,
                    appointments: per_day.get(&date).copied().unwrap_or(0),
                }
            })
            .collect();

        let patient_ids: BTreeSet<Uuid> = appointments.iter().map(|a| a.patient_id).collect();
        let mut patients = Vec::with_capacity(patient_ids.len());
        for patient_id in patient_ids {
            match self.store.get_patient(patient_id).await {
                Ok(patient) => patients.push(patient),
                Err(StoreError::NotFound { .. }) => {
                    warn!("Appointment references missing patient {}", patient_id)
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(DoctorDashboard {
            doctor_id,
            today,
            todays_appointments,
            patients,
            status_counts,
            weekly_appointments,
        })
    }
}
