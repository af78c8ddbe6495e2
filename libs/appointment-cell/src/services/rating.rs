// libs/appointment-cell/src/services/rating.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{ChangeFeed, ClinicStore, StoreError};
use shared_models::clinic::{AppointmentStatus, Rating};
use shared_models::events::{RecordChange, Table};
use shared_utils::validation::{rules, validate, FieldError, ValidationErrors};

use crate::models::{AddRatingRequest, AppointmentError};

pub struct RatingService {
    store: Arc<dyn ClinicStore>,
    feed: ChangeFeed,
}

impl RatingService {
    pub fn new(store: Arc<dyn ClinicStore>, feed: ChangeFeed) -> Self {
        Self { store, feed }
    }

    /// Attaches the patient's rating to a completed appointment.
    ///
    /// Input is validated before the store is touched. Only the appointment's
    /// own patient may rate it, exactly once. The link back to the appointment
    /// is conditional on it still being completed and unrated; if that fails
    /// the rating row is removed again.
    pub async fn add_rating(
        &self,
        appointment_id: Uuid,
        patient_id: Uuid,
        request: AddRatingRequest,
    ) -> Result<Rating, AppointmentError> {
        validate(&request, rules::RATING)?;
        debug!("Rating appointment {} by patient {}", appointment_id, patient_id);

        let appointment = match self.store.get_appointment(appointment_id).await {
            Ok(appointment) => appointment,
            Err(StoreError::NotFound { .. }) => return Err(AppointmentError::NotFound(appointment_id)),
            Err(e) => return Err(e.into()),
        };

        if appointment.patient_id != patient_id {
            return Err(AppointmentError::InvalidRatingTarget(
                "Only the patient who attended this appointment can rate it".to_string(),
            ));
        }
        if request.doctor_id.is_some_and(|id| id != appointment.doctor_id) {
            return Err(AppointmentError::InvalidRatingTarget(
                "The rated doctor does not match the appointment".to_string(),
            ));
        }
        if appointment.status != AppointmentStatus::Completed {
            return Err(AppointmentError::InvalidRatingTarget(format!(
                "Only completed appointments can be rated, this one is {}",
                appointment.status
            )));
        }
        if appointment.rating_id.is_some()
            || self.store.find_rating_for_appointment(appointment_id).await?.is_some()
        {
            return Err(AppointmentError::DuplicateRating(appointment_id));
        }

        let score = request
            .score
            .and_then(|s| u8::try_from(s).ok())
            .ok_or_else(|| {
                AppointmentError::Validation(ValidationErrors(vec![FieldError {
                    field: "score",
                    message: "Rating must be between 1 and 5.",
                }]))
            })?;
        let rating = Rating {
            id: Uuid::new_v4(),
            appointment_id,
            doctor_id: appointment.doctor_id,
            patient_id,
            patient_name: appointment.patient_name.clone(),
            score,
            feedback: request.feedback.trim().to_string(),
            created_at: Utc::now(),
        };

        let saved = match self.store.insert_rating(rating).await {
            Ok(saved) => saved,
            Err(StoreError::UniqueViolation(detail)) => {
                warn!("Concurrent rating for appointment {}: {}", appointment_id, detail);
                return Err(AppointmentError::DuplicateRating(appointment_id));
            }
            Err(e) => return Err(e.into()),
        };
        self.feed.publish(RecordChange::inserted(Table::Ratings, saved.id));

        let appointment = match self.store.link_rating(appointment_id, saved.id).await {
            Ok(appointment) => appointment,
            Err(link_error) => {
                warn!(
                    "Could not link rating {} to appointment {}: {}",
                    saved.id, appointment_id, link_error
                );
                self.store.delete_rating(saved.id).await?;
                self.feed.publish(RecordChange::deleted(Table::Ratings, saved.id));
                return Err(match link_error {
                    StoreError::UniqueViolation(_) => AppointmentError::DuplicateRating(appointment_id),
                    StoreError::PreconditionFailed(_) => AppointmentError::InvalidRatingTarget(
                        "The appointment is no longer completed and cannot be rated".to_string(),
                    ),
                    StoreError::NotFound { .. } => AppointmentError::NotFound(appointment_id),
                    other => other.into(),
                });
            }
        };
        self.feed.publish(RecordChange::updated(Table::Appointments, appointment.id));

        info!("Doctor {} rated {} by patient {}", saved.doctor_id, saved.score, patient_id);
        Ok(saved)
    }
}
