use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::supabase_store::SupabaseStore;
use shared_database::{ClinicStore, StoreError};
use shared_models::clinic::{
    Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, ConsultationType,
};

fn config(uri: String) -> AppConfig {
    AppConfig {
        supabase_url: uri,
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        port: 3000,
    }
}

fn appointment(doctor_id: Uuid) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        patient_name: "John Doe".to_string(),
        doctor_id,
        doctor_name: "Dr. Evelyn Reed".to_string(),
        department: "Cardiology".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        time_slot: "09:00 AM".to_string(),
        status: AppointmentStatus::Upcoming,
        consultation_type: ConsultationType::InPerson,
        consultation_fee: 150.0,
        notes: None,
        rating_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_get_doctor_parses_row() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": doctor_id,
            "name": "Dr. Evelyn Reed",
            "specialty": "Cardiology",
            "consultation_fee": 150.0,
            "bio": null,
            "avatar_url": null
        }])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let doctor = store.get_doctor(doctor_id).await.unwrap();

    assert_eq!(doctor.name, "Dr. Evelyn Reed");
    assert_eq!(doctor.fee_label(), "150.00");
}

#[tokio::test]
async fn test_missing_appointment_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let result = store.get_appointment(Uuid::new_v4()).await;

    assert_matches!(result, Err(StoreError::NotFound { entity: "Appointment", .. }));
}

#[tokio::test]
async fn test_unique_violation_is_distinguished_from_backend_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_active_slot\""
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(500).set_body_string("connection reset"))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let booking = appointment(Uuid::new_v4());

    assert_matches!(
        store.insert_appointment(booking.clone()).await,
        Err(StoreError::UniqueViolation(_))
    );
    assert_matches!(
        store
            .patch_appointment(booking.id, &AppointmentChanges::status(AppointmentStatus::Cancelled))
            .await,
        Err(StoreError::Backend(_))
    );
}

#[tokio::test]
async fn test_list_appointments_sends_filter() {
    let mock_server = MockServer::start().await;
    let booking = appointment(Uuid::new_v4());

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", booking.doctor_id)))
        .and(query_param("date", "eq.2024-06-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let rows = store
        .list_appointments(&AppointmentFilter::for_doctor_on(booking.doctor_id, booking.date))
        .await
        .unwrap();

    assert_eq!(rows, vec![booking]);
}

fn patient_row(email: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "name": "John Doe",
        "email": email,
        "date_of_birth": "1985-05-15",
        "gender": "Male",
        "phone": "555-0101",
        "avatar_url": null
    })
}

#[tokio::test]
async fn test_email_lookup_encodes_plus_sign() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "ilike.john+clinic@example.com"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([patient_row("john+clinic@example.com")])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let found = store.find_patient_by_email("john+clinic@example.com").await.unwrap();

    assert_eq!(found.map(|p| p.email), Some("john+clinic@example.com".to_string()));
}

#[tokio::test]
async fn test_email_lookup_matches_wildcards_literally() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "ilike.john\\_doe\\%1@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let found = store.find_patient_by_email("john_doe%1@example.com").await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn test_patch_appointment_sends_only_changed_columns() {
    let mock_server = MockServer::start().await;
    let mut booking = appointment(Uuid::new_v4());
    let changes = AppointmentChanges::status(AppointmentStatus::Cancelled);
    booking.status = AppointmentStatus::Cancelled;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", booking.id)))
        .and(body_json(json!({ "status": "Cancelled", "updated_at": changes.updated_at })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let updated = store.patch_appointment(booking.id, &changes).await.unwrap();

    assert_eq!(updated.status, AppointmentStatus::Cancelled);
}

#[tokio::test]
async fn test_link_rating_is_conditional_on_completed_unrated_row() {
    let mock_server = MockServer::start().await;
    let booking = appointment(Uuid::new_v4());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", booking.id)))
        .and(query_param("status", "eq.Completed"))
        .and(query_param("rating_id", "is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    let result = store.link_rating(booking.id, Uuid::new_v4()).await;

    assert_matches!(result, Err(StoreError::PreconditionFailed(_)));
}

#[tokio::test]
async fn test_delete_rating_targets_row_by_id() {
    let mock_server = MockServer::start().await;
    let rating_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/ratings"))
        .and(query_param("id", format!("eq.{}", rating_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": rating_id }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&config(mock_server.uri()));
    store.delete_rating(rating_id).await.unwrap();
}
