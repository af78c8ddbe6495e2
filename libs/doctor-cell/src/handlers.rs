use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, require_self};

use crate::models::{
    AvailableSlotsQuery, DoctorSearchFilters, RegisterDoctorRequest, SetUnavailableRequest,
    UpdateDoctorRequest,
};
use crate::services::{AvailabilityService, DoctorService};

fn doctor_service(state: &AppState) -> DoctorService {
    DoctorService::new(state.store.clone(), state.feed.clone())
}

fn availability_service(state: &AppState) -> AvailabilityService {
    AvailabilityService::new(state.store.clone(), state.feed.clone())
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn search_doctors(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<DoctorSearchFilters>,
) -> Result<Json<Value>, AppError> {
    let doctors = doctor_service(&state).search_doctors(filters).await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let specialties = doctor_service(&state).list_specialties().await?;
    Ok(Json(json!({ "specialties": specialties })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let profile = doctor_service(&state).get_profile(doctor_id).await?;
    Ok(Json(json!(profile)))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = availability_service(&state)
        .available_slots(Some(doctor_id), query.date, query.exclude_appointment_id)
        .await?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "available_slots": slots
    })))
}

// ==============================================================================
// PROTECTED HANDLERS (DOCTOR SELF ONLY)
// ==============================================================================

/// Signup: the profile is stored under the caller's own id.
#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let doctor_id = require_role(&user, Role::Doctor)?;

    let doctor = doctor_service(&state).register_doctor(doctor_id, request).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_self(&user, Role::Doctor, doctor_id)?;

    let doctor = doctor_service(&state).update_doctor(doctor_id, request).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn set_unavailable(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<SetUnavailableRequest>,
) -> Result<Json<Value>, AppError> {
    require_self(&user, Role::Doctor, doctor_id)?;

    let entries = availability_service(&state)
        .set_unavailable(doctor_id, &request.dates, &request.times)
        .await?;

    Ok(Json(json!({
        "message": "Availability updated successfully",
        "unavailability": entries
    })))
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_self(&user, Role::Doctor, doctor_id)?;

    let today = Utc::now().date_naive();
    let dashboard = doctor_service(&state).dashboard(doctor_id, today).await?;
    Ok(Json(json!(dashboard)))
}
