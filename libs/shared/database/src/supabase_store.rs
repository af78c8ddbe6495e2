// libs/shared/database/src/supabase_store.rs
//
// PostgREST-backed `ClinicStore`. Uniqueness is enforced by the database:
//
//   create unique index appointments_active_slot
//       on appointments (doctor_id, date, time_slot) where status <> 'Cancelled';
//   create unique index ratings_appointment on ratings (appointment_id);
//   create unique index patients_email on patients (lower(email));
//   create unique index doctor_unavailability_day on doctor_unavailability (doctor_id, date);

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::clinic::{
    Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, Doctor, Notification,
    Patient, Rating, UnavailabilityEntry,
};

use crate::store::{ClinicStore, StoreError, StoreResult};
use crate::supabase::{
    ilike_literal, merge_duplicates, return_representation, SupabaseApiError, SupabaseClient,
};

const DOCTORS: &str = "doctors";
const PATIENTS: &str = "patients";
const APPOINTMENTS: &str = "appointments";
const UNAVAILABILITY: &str = "doctor_unavailability";
const RATINGS: &str = "ratings";
const NOTIFICATIONS: &str = "notifications";

fn classify(error: anyhow::Error) -> StoreError {
    match error.downcast_ref::<SupabaseApiError>() {
        Some(api) if api.is_unique_violation() => {
            warn!("Store rejected write with unique violation: {}", api.body);
            StoreError::UniqueViolation(api.body.clone())
        }
        _ => StoreError::Backend(error.to_string()),
    }
}

pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> StoreResult<Vec<T>> {
        self.select_where(path, &[]).await
    }

    async fn select_where<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_query(Method::GET, path, query, None, None, None)
            .await
            .map_err(classify)?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn select_by_id<T: DeserializeOwned>(
        &self,
        table: &str,
        entity: &'static str,
        id: Uuid,
    ) -> StoreResult<T> {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        self.select::<T>(&path)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(entity, id))
    }

    /// Sends `body` and returns the first row PostgREST echoes back; no row
    /// means the filter in `path` matched nothing.
    async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        headers: reqwest::header::HeaderMap,
        entity: &'static str,
        id: Uuid,
    ) -> StoreResult<T> {
        let body = serde_json::to_value(body)?;
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(method, path, None, Some(body), Some(headers))
            .await
            .map_err(classify)?;

        let first = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(entity, id))?;
        Ok(serde_json::from_value(first)?)
    }

    async fn insert<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        entity: &'static str,
        id: Uuid,
        row: &T,
    ) -> StoreResult<T> {
        debug!("Inserting {} {}", entity, id);
        let path = format!("/rest/v1/{}", table);
        self.write(Method::POST, &path, row, return_representation(), entity, id).await
    }

    async fn update<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        entity: &'static str,
        id: Uuid,
        row: &T,
    ) -> StoreResult<T> {
        debug!("Updating {} {}", entity, id);
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        self.write(Method::PATCH, &path, row, return_representation(), entity, id).await
    }
}

fn appointment_query(filter: &AppointmentFilter) -> String {
    let mut params = Vec::new();
    if let Some(doctor_id) = filter.doctor_id {
        params.push(format!("doctor_id=eq.{}", doctor_id));
    }
    if let Some(patient_id) = filter.patient_id {
        params.push(format!("patient_id=eq.{}", patient_id));
    }
    if let Some(date) = filter.date {
        params.push(format!("date=eq.{}", date.format("%Y-%m-%d")));
    }
    if let Some(status) = filter.status {
        params.push(format!("status=eq.{}", status));
    }
    params.push("order=date.asc".to_string());
    format!("/rest/v1/{}?{}", APPOINTMENTS, params.join("&"))
}

#[async_trait]
impl ClinicStore for SupabaseStore {
    async fn get_doctor(&self, id: Uuid) -> StoreResult<Doctor> {
        self.select_by_id(DOCTORS, "Doctor", id).await
    }

    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        self.select(&format!("/rest/v1/{}?order=name.asc", DOCTORS)).await
    }

    async fn insert_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.insert(DOCTORS, "Doctor", doctor.id, &doctor).await
    }

    async fn update_doctor(&self, doctor: Doctor) -> StoreResult<Doctor> {
        self.update(DOCTORS, "Doctor", doctor.id, &doctor).await
    }

    async fn get_patient(&self, id: Uuid) -> StoreResult<Patient> {
        self.select_by_id(PATIENTS, "Patient", id).await
    }

    async fn find_patient_by_email(&self, email: &str) -> StoreResult<Option<Patient>> {
        let path = format!("/rest/v1/{}", PATIENTS);
        let query = [
            ("email", format!("ilike.{}", ilike_literal(email))),
            ("limit", "1".to_string()),
        ];
        Ok(self.select_where::<Patient>(&path, &query).await?.into_iter().next())
    }

    async fn insert_patient(&self, patient: Patient) -> StoreResult<Patient> {
        self.insert(PATIENTS, "Patient", patient.id, &patient).await
    }

    async fn update_patient(&self, patient: Patient) -> StoreResult<Patient> {
        self.update(PATIENTS, "Patient", patient.id, &patient).await
    }

    async fn get_appointment(&self, id: Uuid) -> StoreResult<Appointment> {
        self.select_by_id(APPOINTMENTS, "Appointment", id).await
    }

    async fn list_appointments(&self, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        self.select(&appointment_query(filter)).await
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.insert(APPOINTMENTS, "Appointment", appointment.id, &appointment).await
    }

    async fn patch_appointment(&self, id: Uuid, changes: &AppointmentChanges) -> StoreResult<Appointment> {
        debug!("Patching appointment {}", id);
        let path = format!("/rest/v1/{}?id=eq.{}", APPOINTMENTS, id);
        self.write(Method::PATCH, &path, changes, return_representation(), "Appointment", id)
            .await
    }

    async fn link_rating(&self, appointment_id: Uuid, rating_id: Uuid) -> StoreResult<Appointment> {
        debug!("Linking rating {} to appointment {}", rating_id, appointment_id);
        let path = format!(
            "/rest/v1/{}?id=eq.{}&status=eq.{}&rating_id=is.null",
            APPOINTMENTS,
            appointment_id,
            AppointmentStatus::Completed
        );
        let body = json!({ "rating_id": rating_id, "updated_at": Utc::now() });
        self.write(Method::PATCH, &path, &body, return_representation(), "Appointment", appointment_id)
            .await
            .map_err(|error| match error {
                StoreError::NotFound { .. } => StoreError::PreconditionFailed(format!(
                    "appointment {} is no longer completed and unrated",
                    appointment_id
                )),
                other => other,
            })
    }

    async fn get_unavailability(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> StoreResult<Option<UnavailabilityEntry>> {
        let path = format!(
            "/rest/v1/{}?doctor_id=eq.{}&date=eq.{}",
            UNAVAILABILITY,
            doctor_id,
            date.format("%Y-%m-%d")
        );
        Ok(self.select::<UnavailabilityEntry>(&path).await?.into_iter().next())
    }

    async fn list_unavailability(&self, doctor_id: Uuid) -> StoreResult<Vec<UnavailabilityEntry>> {
        let path = format!(
            "/rest/v1/{}?doctor_id=eq.{}&order=date.asc",
            UNAVAILABILITY, doctor_id
        );
        self.select(&path).await
    }

    async fn upsert_unavailability(&self, entry: UnavailabilityEntry) -> StoreResult<UnavailabilityEntry> {
        debug!("Upserting unavailability for doctor {} on {}", entry.doctor_id, entry.date);
        // The existing row keeps its id; only the time set is merged in.
        let path = format!("/rest/v1/{}?on_conflict=doctor_id,date&columns=doctor_id,date,times", UNAVAILABILITY);
        self.write(Method::POST, &path, &entry, merge_duplicates(), "Unavailability", entry.id)
            .await
    }

    async fn insert_rating(&self, rating: Rating) -> StoreResult<Rating> {
        self.insert(RATINGS, "Rating", rating.id, &rating).await
    }

    async fn list_ratings_for_doctor(&self, doctor_id: Uuid) -> StoreResult<Vec<Rating>> {
        let path = format!("/rest/v1/{}?doctor_id=eq.{}&order=created_at.desc", RATINGS, doctor_id);
        self.select(&path).await
    }

    async fn find_rating_for_appointment(&self, appointment_id: Uuid) -> StoreResult<Option<Rating>> {
        let path = format!("/rest/v1/{}?appointment_id=eq.{}", RATINGS, appointment_id);
        Ok(self.select::<Rating>(&path).await?.into_iter().next())
    }

    async fn delete_rating(&self, id: Uuid) -> StoreResult<()> {
        debug!("Deleting rating {}", id);
        let path = format!("/rest/v1/{}?id=eq.{}", RATINGS, id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, None, Some(return_representation()))
            .await
            .map_err(classify)?;
        if rows.is_empty() {
            return Err(StoreError::not_found("Rating", id));
        }
        Ok(())
    }

    async fn get_notification(&self, id: Uuid) -> StoreResult<Notification> {
        self.select_by_id(NOTIFICATIONS, "Notification", id).await
    }

    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.insert(NOTIFICATIONS, "Notification", notification.id, &notification).await
    }

    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<Notification>> {
        let path = format!(
            "/rest/v1/{}?user_id=eq.{}&order=created_at.desc",
            NOTIFICATIONS, user_id
        );
        self.select(&path).await
    }

    async fn update_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.update(NOTIFICATIONS, "Notification", notification.id, &notification).await
    }
}
