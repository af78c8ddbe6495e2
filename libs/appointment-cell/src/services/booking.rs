// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::services::AvailabilityService;
use notification_cell::models::NotificationDraft;
use notification_cell::services::NotificationService;
use shared_database::{ChangeFeed, ClinicStore, StoreError};
use shared_models::clinic::{Appointment, AppointmentChanges, AppointmentStatus, Doctor, Patient};
use shared_models::events::{RecordChange, Table};
use shared_utils::validation::{rules, validate, FieldError, ValidationErrors};

use crate::models::{AppointmentError, BookAppointmentRequest, RescheduleAppointmentRequest};

pub struct AppointmentBookingService {
    store: Arc<dyn ClinicStore>,
    feed: ChangeFeed,
    availability: AvailabilityService,
    notifications: NotificationService,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn ClinicStore>, feed: ChangeFeed) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone(), feed.clone()),
            notifications: NotificationService::new(store.clone(), feed.clone()),
            store,
            feed,
        }
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        match self.store.get_appointment(appointment_id).await {
            Ok(appointment) => Ok(appointment),
            Err(StoreError::NotFound { .. }) => Err(AppointmentError::NotFound(appointment_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, AppointmentError> {
        match self.store.get_doctor(doctor_id).await {
            Ok(doctor) => Ok(doctor),
            Err(StoreError::NotFound { .. }) => Err(AppointmentError::DoctorNotFound(doctor_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, AppointmentError> {
        match self.store.get_patient(patient_id).await {
            Ok(patient) => Ok(patient),
            Err(StoreError::NotFound { .. }) => Err(AppointmentError::PatientNotFound(patient_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Rejects the placement unless the slot is currently free. The store's
    /// uniqueness constraint still decides races between concurrent writers.
    async fn ensure_slot_free(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
        rescheduling: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        if self
            .availability
            .is_available(doctor_id, date, time_slot, rescheduling)
            .await?
        {
            Ok(())
        } else {
            warn!("Slot {} on {} for doctor {} is not available", time_slot, date, doctor_id);
            Err(AppointmentError::slot_unavailable(doctor_id, date, time_slot))
        }
    }

    /// Books a free slot for a patient. The new appointment starts Upcoming and
    /// carries the doctor's name, specialty and fee as of now.
    pub async fn book_appointment(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Booking appointment for patient {}", patient_id);
        validate(&request, rules::BOOKING)?;

        let (Some(doctor_id), Some(date), Some(time_slot)) =
            (request.doctor_id, request.date, request.time_slot)
        else {
            return Err(AppointmentError::Validation(missing_selection()));
        };

        let patient = self.get_patient(patient_id).await?;
        let doctor = self.get_doctor(doctor_id).await?;
        self.ensure_slot_free(doctor.id, date, &time_slot, None).await?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            patient_name: patient.name.clone(),
            doctor_id: doctor.id,
            doctor_name: doctor.name.clone(),
            department: doctor.specialty.clone(),
            date,
            time_slot: time_slot.clone(),
            status: AppointmentStatus::Upcoming,
            consultation_type: request.consultation_type,
            consultation_fee: doctor.consultation_fee,
            notes: request.notes.filter(|n| !n.trim().is_empty()),
            rating_id: None,
            created_at: now,
            updated_at: now,
        };

        let saved = match self.store.insert_appointment(appointment).await {
            Ok(saved) => saved,
            Err(StoreError::UniqueViolation(detail)) => {
                warn!("Booking lost the race for its slot: {}", detail);
                return Err(AppointmentError::slot_unavailable(doctor.id, date, &time_slot));
            }
            Err(e) => return Err(e.into()),
        };

        self.feed.publish(RecordChange::inserted(Table::Appointments, saved.id));
        self.notifications
            .notify_or_log(NotificationDraft::appointment_booked(
                saved.doctor_id,
                &saved.patient_name,
                saved.date,
                &saved.time_slot,
            ))
            .await;

        info!(
            "Appointment {} booked with doctor {} on {} at {}",
            saved.id, saved.doctor_id, saved.date, saved.time_slot
        );
        Ok(saved)
    }

    /// Moves an existing appointment. The record keeps its id, status, rating
    /// and any field the request leaves out.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {}", appointment_id);
        validate(&request, rules::BOOKING)?;

        let (Some(date), Some(time_slot)) = (request.date, request.time_slot) else {
            return Err(AppointmentError::Validation(missing_selection()));
        };

        let appointment = self.get_appointment(appointment_id).await?;
        let doctor_id = request.doctor_id.unwrap_or(appointment.doctor_id);
        let doctor = self.get_doctor(doctor_id).await?;

        self.ensure_slot_free(doctor.id, date, &time_slot, Some(appointment.id)).await?;

        let mut changes = AppointmentChanges {
            date: Some(date),
            time_slot: Some(time_slot.clone()),
            consultation_type: request.consultation_type,
            notes: request.notes.map(|n| Some(n).filter(|n| !n.trim().is_empty())),
            ..Default::default()
        };
        if doctor.id != appointment.doctor_id {
            changes.doctor_id = Some(doctor.id);
            changes.doctor_name = Some(doctor.name.clone());
            changes.department = Some(doctor.specialty.clone());
            changes.consultation_fee = Some(doctor.consultation_fee);
        }

        let saved = match self.store.patch_appointment(appointment_id, &changes).await {
            Ok(saved) => saved,
            Err(StoreError::NotFound { .. }) => return Err(AppointmentError::NotFound(appointment_id)),
            Err(StoreError::UniqueViolation(detail)) => {
                warn!("Reschedule of {} lost the race for its slot: {}", appointment_id, detail);
                return Err(AppointmentError::slot_unavailable(doctor.id, date, &time_slot));
            }
            Err(e) => return Err(e.into()),
        };

        self.feed.publish(RecordChange::updated(Table::Appointments, saved.id));
        self.notifications
            .notify_or_log(NotificationDraft::appointment_rescheduled(
                saved.doctor_id,
                &saved.patient_name,
                saved.date,
                &saved.time_slot,
            ))
            .await;

        info!("Appointment {} moved to {} at {}", saved.id, saved.date, saved.time_slot);
        Ok(saved)
    }

    /// Sets any status from any status. Reviving a cancelled appointment whose
    /// slot has since been taken fails with `SlotUnavailable`.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Setting appointment {} to {}", appointment_id, status);

        let appointment = self.get_appointment(appointment_id).await?;
        if appointment.status == status {
            return Ok(appointment);
        }

        let (doctor_id, date, time_slot) = (appointment.doctor_id, appointment.date, appointment.time_slot);
        let saved = match self
            .store
            .patch_appointment(appointment_id, &AppointmentChanges::status(status))
            .await
        {
            Ok(saved) => saved,
            Err(StoreError::NotFound { .. }) => return Err(AppointmentError::NotFound(appointment_id)),
            Err(StoreError::UniqueViolation(_)) => {
                warn!("Cannot revive appointment {}: slot taken", appointment_id);
                return Err(AppointmentError::slot_unavailable(doctor_id, date, &time_slot));
            }
            Err(e) => return Err(e.into()),
        };

        self.feed.publish(RecordChange::updated(Table::Appointments, saved.id));
        self.notifications
            .notify_or_log(NotificationDraft::status_changed(
                saved.patient_id,
                &saved.doctor_name,
                saved.date,
                saved.status,
            ))
            .await;

        info!("Appointment {} is now {}", saved.id, saved.status);
        Ok(saved)
    }
}

/// Fallback for a selection the rule set should already have rejected.
fn missing_selection() -> ValidationErrors {
    ValidationErrors(vec![FieldError {
        field: "time",
        message: "A time for the appointment is required.",
    }])
}
