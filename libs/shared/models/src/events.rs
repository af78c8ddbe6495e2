use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Doctors,
    Patients,
    Appointments,
    Ratings,
    Unavailability,
    Notifications,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A committed write, published for listeners that refresh their views.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordChange {
    pub table: Table,
    pub kind: ChangeKind,
    pub record_id: Uuid,
    pub at: DateTime<Utc>,
}

impl RecordChange {
    pub fn inserted(table: Table, record_id: Uuid) -> Self {
        Self { table, kind: ChangeKind::Inserted, record_id, at: Utc::now() }
    }

    pub fn updated(table: Table, record_id: Uuid) -> Self {
        Self { table, kind: ChangeKind::Updated, record_id, at: Utc::now() }
    }

    pub fn deleted(table: Table, record_id: Uuid) -> Self {
        Self { table, kind: ChangeKind::Deleted, record_id, at: Utc::now() }
    }
}
