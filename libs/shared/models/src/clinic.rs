// libs/shared/models/src/clinic.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// DOCTORS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    /// Non-negative; zero means the consultation is free.
    pub consultation_fee: f64,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

impl Doctor {
    /// Avatar shown when the doctor has not uploaded one.
    pub fn avatar_or_default(&self) -> String {
        self.avatar_url
            .clone()
            .unwrap_or_else(|| format!("https://i.pravatar.cc/150?u={}", self.id))
    }

    pub fn bio_or_default(&self) -> &str {
        self.bio.as_deref().unwrap_or("")
    }

    pub fn fee_label(&self) -> String {
        if self.consultation_fee > 0.0 {
            format!("{:.2}", self.consultation_fee)
        } else {
            "Free".to_string()
        }
    }
}

/// Blocked time slots for one doctor on one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnavailabilityEntry {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub times: Vec<String>,
}

// ==============================================================================
// PATIENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub phone: String,
    pub avatar_url: Option<String>,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Upcoming,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Cancelled appointments release their slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Upcoming => write!(f, "Upcoming"),
            AppointmentStatus::Completed => write!(f, "Completed"),
            AppointmentStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConsultationType {
    Online,
    #[serde(rename = "In-Person", alias = "InPerson")]
    InPerson,
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationType::Online => write!(f, "Online"),
            ConsultationType::InPerson => write!(f, "In-Person"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    /// Doctor's specialty copied at booking time.
    pub department: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: AppointmentStatus,
    pub consultation_type: ConsultationType,
    /// Doctor's fee copied at booking time.
    pub consultation_fee: f64,
    pub notes: Option<String>,
    pub rating_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Whether this row occupies (doctor, date, slot) for uniqueness purposes.
    pub fn occupies(&self, doctor_id: Uuid, date: NaiveDate, time_slot: &str) -> bool {
        self.status.holds_slot()
            && self.doctor_id == doctor_id
            && self.date == date
            && self.time_slot == time_slot
    }
}

/// Columns to overwrite on an existing appointment. `None` leaves the column
/// as currently stored; `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AppointmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_type: Option<ConsultationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    pub updated_at: DateTime<Utc>,
}

impl Default for AppointmentChanges {
    fn default() -> Self {
        Self {
            doctor_id: None,
            doctor_name: None,
            department: None,
            consultation_fee: None,
            date: None,
            time_slot: None,
            status: None,
            consultation_type: None,
            notes: None,
            updated_at: Utc::now(),
        }
    }
}

impl AppointmentChanges {
    pub fn status(status: AppointmentStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn apply(&self, appointment: &mut Appointment) {
        if let Some(doctor_id) = self.doctor_id {
            appointment.doctor_id = doctor_id;
        }
        if let Some(doctor_name) = &self.doctor_name {
            appointment.doctor_name = doctor_name.clone();
        }
        if let Some(department) = &self.department {
            appointment.department = department.clone();
        }
        if let Some(fee) = self.consultation_fee {
            appointment.consultation_fee = fee;
        }
        if let Some(date) = self.date {
            appointment.date = date;
        }
        if let Some(time_slot) = &self.time_slot {
            appointment.time_slot = time_slot.clone();
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(consultation_type) = self.consultation_type {
            appointment.consultation_type = consultation_type;
        }
        if let Some(notes) = &self.notes {
            appointment.notes = notes.clone();
        }
        appointment.updated_at = self.updated_at;
    }
}

/// Column-match filter for appointment listings. `None` fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentFilter {
    pub doctor_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn for_doctor_on(doctor_id: Uuid, date: NaiveDate) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            date: Some(date),
            ..Default::default()
        }
    }

    pub fn for_doctor(doctor_id: Uuid) -> Self {
        Self {
            doctor_id: Some(doctor_id),
            ..Default::default()
        }
    }

    pub fn for_patient(patient_id: Uuid) -> Self {
        Self {
            patient_id: Some(patient_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        self.doctor_id.map_or(true, |id| appointment.doctor_id == id)
            && self.patient_id.map_or(true, |id| appointment.patient_id == id)
            && self.date.map_or(true, |date| appointment.date == date)
            && self.status.map_or(true, |status| appointment.status == status)
    }
}

// ==============================================================================
// RATINGS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub score: u8,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Patient,
    Doctor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_type: UserType,
    pub message: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(fee: f64) -> Doctor {
        Doctor {
            id: Uuid::new_v4(),
            name: "Dr. Evelyn Reed".to_string(),
            specialty: "Cardiology".to_string(),
            consultation_fee: fee,
            bio: None,
            avatar_url: None,
        }
    }

    #[test]
    fn test_doctor_display_defaults() {
        let doc = doctor(0.0);
        assert_eq!(doc.fee_label(), "Free");
        assert_eq!(doc.bio_or_default(), "");
        assert!(doc.avatar_or_default().ends_with(&doc.id.to_string()));

        assert_eq!(doctor(150.0).fee_label(), "150.00");
    }

    #[test]
    fn test_consultation_type_wire_format() {
        let json = serde_json::to_string(&ConsultationType::InPerson).unwrap();
        assert_eq!(json, "\"In-Person\"");
        let parsed: ConsultationType = serde_json::from_str("\"Online\"").unwrap();
        assert_eq!(parsed, ConsultationType::Online);
    }

    #[test]
    fn test_filter_matching() {
        let doctor_id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            patient_name: "John Doe".to_string(),
            doctor_id,
            doctor_name: "Dr. Evelyn Reed".to_string(),
            department: "Cardiology".to_string(),
            date,
            time_slot: "09:00 AM".to_string(),
            status: AppointmentStatus::Cancelled,
            consultation_type: ConsultationType::Online,
            consultation_fee: 150.0,
            notes: None,
            rating_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(AppointmentFilter::for_doctor_on(doctor_id, date).matches(&appointment));
        assert!(!AppointmentFilter::for_doctor(Uuid::new_v4()).matches(&appointment));
        assert!(!appointment.occupies(doctor_id, date, "09:00 AM"));
    }

    #[test]
    fn test_changes_touch_only_given_columns() {
        let changes = AppointmentChanges {
            time_slot: Some("02:00 PM".to_string()),
            notes: Some(None),
            ..Default::default()
        };

        let body = serde_json::to_value(&changes).unwrap();
        let columns = body.as_object().unwrap();
        assert_eq!(columns.len(), 3);
        assert_eq!(columns["time_slot"], "02:00 PM");
        assert!(columns["notes"].is_null());
        assert!(columns.contains_key("updated_at"));

        let mut appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            patient_name: "John Doe".to_string(),
            doctor_id: Uuid::new_v4(),
            doctor_name: "Dr. Evelyn Reed".to_string(),
            department: "Cardiology".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            time_slot: "09:00 AM".to_string(),
            status: AppointmentStatus::Completed,
            consultation_type: ConsultationType::Online,
            consultation_fee: 150.0,
            notes: Some("Bring previous results.".to_string()),
            rating_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        changes.apply(&mut appointment);

        assert_eq!(appointment.time_slot, "02:00 PM");
        assert_eq!(appointment.notes, None);
        assert_eq!(appointment.status, AppointmentStatus::Completed);
        assert_eq!(appointment.updated_at, changes.updated_at);
    }
}
