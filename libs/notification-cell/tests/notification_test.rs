use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use notification_cell::models::{NotificationDraft, NotificationError};
use notification_cell::router::notification_routes;
use notification_cell::services::NotificationService;
use shared_database::seed::SeedRecords;
use shared_database::{AppState, ChangeFeed, InMemoryStore};
use shared_models::clinic::AppointmentStatus;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn service() -> NotificationService {
    NotificationService::new(Arc::new(InMemoryStore::new()), ChangeFeed::default())
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let service = service();
    let doctor = Uuid::new_v4();

    service
        .notify(NotificationDraft::appointment_booked(doctor, "John Doe", date(), "09:00 AM"))
        .await
        .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let latest = service
        .notify(NotificationDraft::appointment_booked(doctor, "Jane Smith", date(), "09:30 AM"))
        .await
        .unwrap();
    service
        .notify(NotificationDraft::status_changed(Uuid::new_v4(), "Dr. Reed", date(), AppointmentStatus::Completed))
        .await
        .unwrap();

    let listed = service.list_for_user(doctor).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, latest.id);
    assert!(listed.iter().all(|n| !n.read));
}

#[tokio::test]
async fn test_mark_read_only_for_recipient() {
    let service = service();
    let patient = Uuid::new_v4();
    let notification = service
        .notify(NotificationDraft::status_changed(patient, "Dr. Reed", date(), AppointmentStatus::Cancelled))
        .await
        .unwrap();

    let result = service.mark_read(Uuid::new_v4(), notification.id).await;
    assert_matches!(result, Err(NotificationError::NotFound(_)));

    let read = service.mark_read(patient, notification.id).await.unwrap();
    assert!(read.read);
    assert!(service.list_for_user(patient).await.unwrap()[0].read);
}

#[tokio::test]
async fn test_router_lists_callers_notifications() {
    let config = TestConfig::default().to_app_config();
    let state = Arc::new(AppState::in_memory(config, SeedRecords::default()).unwrap());
    let user = TestUser::doctor("doc@example.com");

    let service = NotificationService::new(state.store.clone(), state.feed.clone());
    service
        .notify(NotificationDraft::appointment_booked(user.id, "John Doe", date(), "10:00 AM"))
        .await
        .unwrap();

    let token = JwtTestUtils::create_test_token(&user, &state.config.supabase_jwt_secret, Some(1));
    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = notification_routes(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["unread"], 1);
    assert_eq!(body["notifications"][0]["link"], "/doctor/dashboard");
}
