use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
    body::Body,
};
use uuid::Uuid;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_config::AppConfig;

use crate::jwt::validate_token;

pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.supabase_jwt_secret)
        .map_err(|e| AppError::Auth(e.to_string()))?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Caller must be the owner of `id` acting in `role`.
pub fn require_self(user: &User, role: Role, id: Uuid) -> Result<(), AppError> {
    if user.is(role, id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Not authorized to act on this {:?} record", role)))
    }
}

/// Caller must hold `role`; returns the caller's id.
pub fn require_role(user: &User, role: Role) -> Result<Uuid, AppError> {
    match (user.clinic_role(), user.uuid()) {
        (Some(actual), Some(id)) if actual == role => Ok(id),
        _ => Err(AppError::Forbidden(format!("Only a {:?} may perform this action", role))),
    }
}
