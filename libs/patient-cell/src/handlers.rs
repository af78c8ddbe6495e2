use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_role, require_self};

use crate::models::{RegisterPatientRequest, UpdatePatientRequest};
use crate::services::PatientService;

fn patient_service(state: &AppState) -> PatientService {
    PatientService::new(state.store.clone(), state.feed.clone())
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let patient_id = require_role(&user, Role::Patient)?;

    let patient = patient_service(&state).register_patient(patient_id, request).await?;
    Ok(Json(json!(patient)))
}

/// Patients see their own profile; doctors may look up any patient.
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    if user.clinic_role() != Some(Role::Doctor) {
        require_self(&user, Role::Patient, patient_id)?;
    }

    let patient = patient_service(&state).get_patient(patient_id).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<Value>, AppError> {
    require_self(&user, Role::Patient, patient_id)?;

    let patient = patient_service(&state).update_patient(patient_id, request).await?;
    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_self(&user, Role::Patient, patient_id)?;

    let dashboard = patient_service(&state).dashboard(patient_id).await?;
    Ok(Json(json!(dashboard)))
}
