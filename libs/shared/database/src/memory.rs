// libs/shared/database/src/memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::clinic::{
    Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, Doctor, Notification,
    Patient, Rating, UnavailabilityEntry,
};

use crate::seed::SeedRecords;
use crate::store::{ClinicStore, StoreError, StoreResult};

trait Keyed {
    const ENTITY: &'static str;
    fn key(&self) -> Uuid;
}

macro_rules! keyed {
    ($ty:ty, $entity:literal) => {
        impl Keyed for $ty {
            const ENTITY: &'static str = $entity;
            fn key(&self) -> Uuid {
                self.id
            }
        }
    };
}

keyed!(Doctor, "Doctor");
keyed!(Patient, "Patient");
keyed!(Appointment, "Appointment");
keyed!(Rating, "Rating");
keyed!(UnavailabilityEntry, "Unavailability");
keyed!(Notification, "Notification");

/// Arena of rows with an id -> position index.
struct Arena<T> {
    rows: Vec<T>,
    index: HashMap<Uuid, usize>,
}

impl<T: Keyed + Clone> Arena<T> {
    fn new() -> Self {
        Self { rows: Vec::new(), index: HashMap::new() }
    }

    fn get(&self, id: Uuid) -> StoreResult<T> {
        self.index
            .get(&id)
            .map(|&pos| self.rows[pos].clone())
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))
    }

    fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.iter().find(|row| predicate(row)).cloned()
    }

    fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.iter().filter(|row| predicate(row)).cloned().collect()
    }

    fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.rows.iter().any(predicate)
    }

    fn insert(&mut self, row: T) -> StoreResult<T> {
        let id = row.key();
        if self.index.contains_key(&id) {
            return Err(StoreError::UniqueViolation(format!("{} id {} already exists", T::ENTITY, id)));
        }
        self.index.insert(id, self.rows.len());
        self.rows.push(row.clone());
        Ok(row)
    }

    fn replace(&mut self, row: T) -> StoreResult<T> {
        let id = row.key();
        let pos = *self
            .index
            .get(&id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))?;
        self.rows[pos] = row.clone();
        Ok(row)
    }

    fn remove(&mut self, id: Uuid) -> StoreResult<T> {
        let pos = self
            .index
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))?;
        let row = self.rows.swap_remove(pos);
        if let Some(moved) = self.rows.get(pos) {
            self.index.insert(moved.key(), pos);
        }
        Ok(row)
    }
}

struct Tables {
    doctors: Arena<Doctor>,
    patients: Arena<Patient>,
    appointments: Arena<Appointment>,
    ratings: Arena<Rating>,
    unavailability: Arena<UnavailabilityEntry>,
    notifications: Arena<Notification>,
}

impl Tables {
    fn empty() -> Self {
        Self {
            doctors: Arena::new(),
            patients: Arena::new(),
            appointments: Arena::new(),
            ratings: Arena::new(),
            unavailability: Arena::new(),
            notifications: Arena::new(),
        }
    }

    fn slot_taken_by_other(&self, appointment: &Appointment) -> bool {
        appointment.status.holds_slot()
            && self.appointments.any(|other| {
                other.id != appointment.id
                    && other.occupies(appointment.doctor_id, appointment.date, &appointment.time_slot)
            })
    }

    fn email_taken_by_other(&self, patient: &Patient) -> bool {
        self.patients.any(|other| {
            other.id != patient.id && other.email.eq_ignore_ascii_case(&patient.email)
        })
    }
}

/// Process-local store used for tests and as the fallback when no hosted
/// backend is configured. Constraint checks run under the write lock, so
/// concurrent writers cannot both claim the same slot.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { tables: RwLock::new(Tables::empty()) }
    }

    /// Store pre-populated with `records`; the same constraints apply as for
    /// rows written through [`ClinicStore`].
    pub fn with_records(records: SeedRecords) -> StoreResult<Self> {
        let mut tables = Tables::empty();
        for doctor in records.doctors {
            tables.doctors.insert(doctor)?;
        }
        for patient in records.patients {
            if tables.email_taken_by_other(&patient) {
                return Err(StoreError::UniqueViolation(format!("email {} already registered", patient.email)));
            }
            tables.patients.insert(patient)?;
        }
        for appointment in records.appointments {
            if tables.slot_taken_by_other(&appointment) {
                return Err(StoreError::UniqueViolation(format!(
                    "doctor {} already booked on {} at {}",
                    appointment.doctor_id, appointment.date, appointment.time_slot
                )));
            }
            tables.appointments.insert(appointment)?;
        }
        for rating in records.ratings {
            tables.ratings.insert(rating)?;
        }
        for entry in records.unavailability {
            tables.unavailability.insert(entry)?;
        }
        Ok(Self { tables: RwLock::new(tables) })
    }

    /// Number of appointment rows, cancelled ones included.
    pub async fn appointment_count(&self) -> usize {
        self.tables.read().await.appointments.rows.len()
    }

    pub async fn rating_count(&self) -> usize {
        self.tables.read().await.ratings.rows.len()
    }
}

#[async_trait]
impl ClinicStore for InMemoryStore {
    async fn get_doctor(&self, id: Uuid) -> StoreResult<Doctor> {
        self.tables.read().await.doctors.get(id)
    }

    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        Ok(self.tables.read().await.doctors.rows.clone())
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        debug!("Inserting doctor {}", doctor.id);
        self.tables.write().await.doctors.insert(doctor)
    }

    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.tables.write().await.doctors.replace(doctor)
    }

    async fn get_patient(&self, id: Uuid) -> StoreResult<Patient> {
        self.tables.read().await.patients.get(id)
    }

    async fn find_patient_by_email(&self, email: &str) -> StoreResult<Option<Patient>> {
        Ok(self
            .tables
            .read()
            .await
            .patients
            .find(|patient| patient.email.eq_ignore_ascii_case(email)))
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient> {
        let mut tables = self.tables.write().await;
        if tables.email_taken_by_other(&patient) {
            return Err(StoreError::UniqueViolation(format!("email {} already registered", patient.email)));
        }
        tables.patients.insert(patient)
    }

    async fn update_patient(&self, patient: Patient) -> StoreResult<Patient> {
        let mut tables = self.tables.write().await;
        if tables.email_taken_by_other(&patient) {
            return Err(StoreError::UniqueViolation(format!("email {} already registered", patient.email)));
        }
        tables.patients.replace(patient)
    }

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Appointment> {
        self.tables.read().await.appointments.get(id)
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        Ok(self.tables.read().await.appointments.filter(|row| filter.matches(row)))
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        if tables.slot_taken_by_other(&appointment) {
            warn!(
                "Rejecting appointment {}: doctor {} already booked on {} at {}",
                appointment.id, appointment.doctor_id, appointment.date, appointment.time_slot
            );
            return Err(StoreError::UniqueViolation(format!(
                "doctor {} already booked on {} at {}",
                appointment.doctor_id, appointment.date, appointment.time_slot
            )));
        }
        tables.appointments.insert(appointment)
    }

    async fn patch_appointment(&self, id: Uuid, changes: &AppointmentChanges) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        let mut appointment = tables.appointments.get(id)?;
        changes.apply(&mut appointment);
        if tables.slot_taken_by_other(&appointment) {
            warn!(
                "Rejecting update of appointment {}: slot {} on {} is held by another booking",
                appointment.id, appointment.time_slot, appointment.date
            );
            return Err(StoreError::UniqueViolation(format!(
                "doctor {} already booked on {} at {}",
                appointment.doctor_id, appointment.date, appointment.time_slot
            )));
        }
        tables.appointments.replace(appointment)
    }

    async fn link_rating(&self, appointment_id: Uuid, rating_id: Uuid) -> StoreResult<Appointment> {
        let mut tables = self.tables.write().await;
        let mut appointment = tables.appointments.get(appointment_id)?;
        if appointment.rating_id.is_some() {
            return Err(StoreError::UniqueViolation(format!("appointment {} already rated", appointment_id)));
        }
        if appointment.status != AppointmentStatus::Completed {
            return Err(StoreError::PreconditionFailed(format!(
                "appointment {} is {} and cannot be rated",
                appointment_id, appointment.status
            )));
        }
        appointment.rating_id = Some(rating_id);
        appointment.updated_at = Utc::now();
        tables.appointments.replace(appointment)
    }

    async fn get_unavailability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<UnavailabilityEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .unavailability
            .find(|entry| entry.doctor_id == doctor_id && entry.date == date))
    }

    async fn list_unavailability(&self, doctor_id: Uuid) -> StoreResult<Vec<UnavailabilityEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .unavailability
            .filter(|entry| entry.doctor_id == doctor_id))
    }

    async fn upsert_unavailability(&self, mut entry: UnavailabilityEntry) -> StoreResult<UnavailabilityEntry> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .unavailability
            .find(|row| row.doctor_id == entry.doctor_id && row.date == entry.date);

        match existing {
            Some(row) => {
                entry.id = row.id;
                tables.unavailability.replace(entry)
            }
            None => tables.unavailability.insert(entry),
        }
    }

    async fn insert_rating(&self, rating: Rating) -> StoreResult<Rating> {
        let mut tables = self.tables.write().await;
        if tables.ratings.any(|row| row.appointment_id == rating.appointment_id) {
            return Err(StoreError::UniqueViolation(format!(
                "appointment {} already rated",
                rating.appointment_id
            )));
        }
        tables.ratings.insert(rating)
    }

    async fn list_ratings_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Rating>> {
        Ok(self.tables.read().await.ratings.filter(|row| row.doctor_id == doctor_id))
    }

    async fn find_rating_for_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Rating>> {
        Ok(self
            .tables
            .read()
            .await
            .ratings
            .find(|row| row.appointment_id == appointment_id))
    }

    async fn delete_rating(&self, id: Uuid) -> StoreResult<()> {
        self.tables.write().await.ratings.remove(id).map(|_| ())
    }

    async fn get_notification(&self, id: Uuid) -> StoreResult<Notification> {
        self.tables.read().await.notifications.get(id)
    }

    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.tables.write().await.notifications.insert(notification)
    }

    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<Notification>> {
        Ok(self
            .tables
            .read()
            .await
            .notifications
            .filter(|row| row.user_id == user_id))
    }

    async fn update_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.tables.write().await.notifications.replace(notification)
    }
}
