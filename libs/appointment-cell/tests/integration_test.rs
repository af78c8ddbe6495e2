use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use appointment_cell::router::appointment_routes;
use shared_database::seed::{appointment_id, demo_records, doctor_id, patient_id};
use shared_database::AppState;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn create_test_state() -> Arc<AppState> {
    let config = TestConfig::default().to_app_config();
    let today = Utc::now().date_naive();
    Arc::new(AppState::in_memory(config, demo_records(today)).unwrap())
}

fn create_test_app(state: Arc<AppState>) -> Router {
    appointment_routes(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn authed(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn token_for(state: &AppState, id: Uuid, role: &str) -> String {
    let user = TestUser::new(id, "user@example.com", role);
    JwtTestUtils::create_test_token(&user, &state.config.supabase_jwt_secret, Some(1))
}

fn in_days(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = create_test_app(create_test_state());

    let request = Request::builder()
        .method("GET")
        .uri(format!("/{}", appointment_id(1)))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_patient_books_free_slot() {
    let state = create_test_state();
    let token = token_for(&state, patient_id(2), "patient");
    let app = create_test_app(state);

    let body = json!({
        "doctor_id": doctor_id(1),
        "date": in_days(7),
        "time_slot": "11:30 AM",
        "consultation_type": "In-Person"
    });
    let response = app.oneshot(authed("POST", "/", &token, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "Upcoming");
    assert_eq!(body["doctor_name"], "Dr. Evelyn Reed");
    assert_eq!(body["patient_id"], json!(patient_id(2)));
}

#[tokio::test]
async fn test_double_booking_returns_conflict() {
    let state = create_test_state();
    let token = token_for(&state, patient_id(2), "patient");
    let app = create_test_app(state);

    let body = json!({
        "doctor_id": doctor_id(1),
        "date": in_days(7),
        "time_slot": "10:00 AM"
    });
    let response = app.oneshot(authed("POST", "/", &token, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_doctor_cannot_book_as_patient() {
    let state = create_test_state();
    let token = token_for(&state, doctor_id(1), "doctor");
    let app = create_test_app(state);

    let body = json!({
        "doctor_id": doctor_id(1),
        "date": in_days(7),
        "time_slot": "11:30 AM"
    });
    let response = app.oneshot(authed("POST", "/", &token, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_only_participants_can_view_appointment() {
    let state = create_test_state();
    let patient = token_for(&state, patient_id(1), "patient");
    let doctor = token_for(&state, doctor_id(1), "doctor");
    let stranger = token_for(&state, patient_id(3), "patient");
    let app = create_test_app(state);
    let uri = format!("/{}", appointment_id(1));

    let response = app.clone().oneshot(authed("GET", &uri, &patient, Value::Null)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(authed("GET", &uri, &doctor, Value::Null)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(authed("GET", &uri, &stranger, Value::Null)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reschedule_and_cancel_through_router() {
    let state = create_test_state();
    let token = token_for(&state, patient_id(1), "patient");
    let app = create_test_app(state);

    let uri = format!("/{}/reschedule", appointment_id(1));
    let body = json!({ "date": in_days(9), "time_slot": "02:30 PM" });
    let response = app.clone().oneshot(authed("PUT", &uri, &token, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let moved = body_json(response).await;
    assert_eq!(moved["id"], json!(appointment_id(1)));
    assert_eq!(moved["time_slot"], "02:30 PM");

    let uri = format!("/{}/status", appointment_id(1));
    let response = app
        .oneshot(authed("PATCH", &uri, &token, json!({ "status": "Cancelled" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "Cancelled");
}

#[tokio::test]
async fn test_rating_errors_map_to_status_codes() {
    let state = create_test_state();
    let token = token_for(&state, patient_id(1), "patient");
    let app = create_test_app(state);

    let invalid = json!({ "score": 6, "feedback": "short" });
    let uri = format!("/{}/rating", appointment_id(2));
    let response = app.clone().oneshot(authed("POST", &uri, &token, invalid)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let duplicate = json!({ "score": 4, "feedback": "Another look at the same visit." });
    let response = app.oneshot(authed("POST", &uri, &token, duplicate)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
