use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{ChangeFeed, ClinicStore, StoreError};
use shared_models::clinic::{AppointmentFilter, UnavailabilityEntry};
use shared_models::events::{RecordChange, Table};

use crate::models::AvailabilityError;
use crate::services::slots::{catalog_position, is_catalog_slot, slot_catalog};

/// Catalog slots not present in `blocked` or `booked`, in catalog order.
pub fn resolve_slots(blocked: &HashSet<String>, booked: &HashSet<String>) -> Vec<String> {
    slot_catalog()
        .iter()
        .filter(|slot| !blocked.contains(**slot) && !booked.contains(**slot))
        .map(|slot| slot.to_string())
        .collect()
}

/// Union of `existing` and `added`, deduplicated and in catalog order.
pub fn merge_blocked_times(existing: &[String], added: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = existing
        .iter()
        .chain(added.iter())
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    merged.sort_by_key(|slot| catalog_position(slot));
    merged
}

pub struct AvailabilityService {
    store: Arc<dyn ClinicStore>,
    feed: ChangeFeed,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn ClinicStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    /// Free slots for a doctor on a date.
    ///
    /// Returns an empty list when either the doctor or the date has not been
    /// chosen yet. `exclude_appointment_id` leaves that appointment's own slot
    /// free so a reschedule can keep it.
    pub async fn available_slots(
        &self,
        doctor_id: Option<Uuid>,
        date: Option<NaiveDate>,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<Vec<String>, AvailabilityError> {
        let (doctor_id, date) = match (doctor_id, date) {
            (Some(doctor_id), Some(date)) => (doctor_id, date),
            _ => return Ok(Vec::new()),
        };

        debug!("Resolving available slots for doctor {} on {}", doctor_id, date);
        self.ensure_doctor(doctor_id).await?;

        let blocked = self.blocked_slots(doctor_id, date).await?;
        let booked = self.booked_slots(doctor_id, date, exclude_appointment_id).await?;
        let available = resolve_slots(&blocked, &booked);

        debug!(
            "Doctor {} on {}: {} blocked, {} booked, {} available",
            doctor_id,
            date,
            blocked.len(),
            booked.len(),
            available.len()
        );
        Ok(available)
    }

    pub async fn is_available(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        time_slot: &str,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<bool, AvailabilityError> {
        let available = self
            .available_slots(Some(doctor_id), Some(date), exclude_appointment_id)
            .await?;
        Ok(available.iter().any(|slot| slot == time_slot))
    }

    /// Blocks `times` on every date in `dates`, merging with what is already
    /// blocked. An empty `times` blocks the whole catalog.
    pub async fn set_unavailable(
        &self,
        doctor_id: Uuid,
        dates: &[NaiveDate],
        times: &[String],
    ) -> Result<Vec<UnavailabilityEntry>, AvailabilityError> {
        if dates.is_empty() {
            return Err(AvailabilityError::NoDates);
        }
        if let Some(unknown) = times.iter().find(|t| !is_catalog_slot(t)) {
            return Err(AvailabilityError::UnknownTimeSlot(unknown.clone()));
        }
        self.ensure_doctor(doctor_id).await?;

        let to_block: Vec<String> = if times.is_empty() {
            slot_catalog().iter().map(|slot| slot.to_string()).collect()
        } else {
            times.to_vec()
        };

        let unique_dates: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        let mut entries = Vec::with_capacity(unique_dates.len());

        for date in unique_dates {
            let existing = self.store.get_unavailability(doctor_id, date).await?;
            let replaces_existing = existing.is_some();
            let entry = match existing {
                Some(current) => UnavailabilityEntry {
                    times: merge_blocked_times(&current.times, &to_block),
                    ..current
                },
                None => UnavailabilityEntry {
                    id: Uuid::new_v4(),
                    doctor_id,
                    date,
                    times: merge_blocked_times(&[], &to_block),
                },
            };

            // The store keeps the id of a row written concurrently for the same
            // date, so events carry the id it returns.
            let saved = self.store.upsert_unavailability(entry).await?;
            self.feed.publish(if replaces_existing {
                RecordChange::updated(Table::Unavailability, saved.id)
            } else {
                RecordChange::inserted(Table::Unavailability, saved.id)
            });
            entries.push(saved);
        }

        info!("Doctor {} blocked time on {} date(s)", doctor_id, entries.len());
        Ok(entries)
    }

    async fn ensure_doctor(&self, doctor_id: Uuid) -> Result<(), AvailabilityError> {
        match self.store.get_doctor(doctor_id).await {
            Ok(_) => Ok(()),
            Err(StoreError::NotFound { .. }) => Err(AvailabilityError::DoctorNotFound(doctor_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn blocked_slots(&self, doctor_id: Uuid, date: NaiveDate) -> Result<HashSet<String>, AvailabilityError> {
        let entry = self.store.get_unavailability(doctor_id, date).await?;
        Ok(entry.map(|e| e.times.into_iter().collect()).unwrap_or_default())
    }

    async fn booked_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        exclude_appointment_id: Option<Uuid>,
    ) -> Result<HashSet<String>, AvailabilityError> {
        let appointments = self
            .store
            .list_appointments(&AppointmentFilter::for_doctor_on(doctor_id, date))
            .await?;

        Ok(appointments
            .into_iter()
            .filter(|a| a.status.holds_slot())
            .filter(|a| Some(a.id) != exclude_appointment_id)
            .map(|a| a.time_slot)
            .collect())
    }
}
