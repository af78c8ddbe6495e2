use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};
use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn patient_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(register_patient))
        .route("/{id}", get(get_patient).put(update_patient))
        .route("/{id}/dashboard", get(get_dashboard))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
