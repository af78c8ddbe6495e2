// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::clinic::Appointment;
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{AddRatingRequest, BookAppointmentRequest, RescheduleAppointmentRequest, UpdateStatusRequest};
use crate::services::{AppointmentBookingService, RatingService};

fn booking_service(state: &AppState) -> AppointmentBookingService {
    AppointmentBookingService::new(state.store.clone(), state.feed.clone())
}

/// The appointment's patient and doctor may both act on it.
fn ensure_participant(user: &User, appointment: &Appointment) -> Result<(), AppError> {
    if user.is(Role::Patient, appointment.patient_id) || user.is(Role::Doctor, appointment.doctor_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to access this appointment".to_string()))
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = require_role(&user, Role::Patient)?;

    let appointment = booking_service(&state).book_appointment(patient_id, request).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let appointment = booking_service(&state).get_appointment(appointment_id).await?;
    ensure_participant(&user, &appointment)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);
    let current = service.get_appointment(appointment_id).await?;
    ensure_participant(&user, &current)?;

    let appointment = service.reschedule_appointment(appointment_id, request).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = booking_service(&state);
    let current = service.get_appointment(appointment_id).await?;
    ensure_participant(&user, &current)?;

    let appointment = service.update_status(appointment_id, request.status).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn add_rating(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<AddRatingRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = require_role(&user, Role::Patient)?;

    let rating = RatingService::new(state.store.clone(), state.feed.clone())
        .add_rating(appointment_id, patient_id, request)
        .await?;

    Ok(Json(json!({
        "message": "Thank you for your feedback!",
        "rating": rating
    })))
}
