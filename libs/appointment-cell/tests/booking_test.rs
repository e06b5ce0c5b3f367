use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{AppointmentRequest, BookingError, BookingService};
use shared_backend::BackendClient;
use shared_config::AppConfig;

fn test_config(backend_url: &str) -> AppConfig {
    AppConfig {
        backend_url: backend_url.to_string(),
        chatbot_api_key: "test-key".to_string(),
        ..AppConfig::default()
    }
}

fn test_service(config: &AppConfig) -> BookingService {
    BookingService::new(config, Arc::new(BackendClient::new(config)))
}

fn full_request() -> AppointmentRequest {
    AppointmentRequest {
        client_name: Some("Juan Pérez".to_string()),
        social_work: Some("Swiss Medical".to_string()),
        phone: Some("5493700000001".to_string()),
        date: Some("2024-06-10".to_string()),
        time: Some("10:00".to_string()),
        email: None,
    }
}

fn created_body() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "_id": "665f0c2ab67a1a0012aa0001",
            "clientName": "Juan Pérez",
            "socialWork": "Swiss Medical",
            "phone": "5493700000001",
            "date": "2024-06-10",
            "time": "10:00",
            "status": "pending"
        }
    })
}

#[tokio::test]
async fn create_appointment_posts_standardized_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/appointments"))
        .and(body_partial_json(json!({
            "clientName": "Juan Pérez",
            "socialWork": "Swiss Medical",
            "date": "2024-06-10",
            "time": "10:00",
            "isSobreturno": false,
            "status": "pending",
            "attended": false,
            "email": "5493700000001@phone.com"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_body()))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let confirmation = test_service(&config)
        .create_appointment(full_request())
        .await
        .expect("booking should succeed");

    assert_eq!(confirmation.time, "10:00");
    assert_eq!(confirmation.client_name, "Juan Pérez");
}

#[tokio::test]
async fn missing_optional_fields_get_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/appointments"))
        .and(body_partial_json(json!({
            "clientName": "Sin nombre",
            "socialWork": "CONSULTA PARTICULAR",
            "time": "10:00"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(created_body()))
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let result = test_service(&config)
        .create_appointment(AppointmentRequest::default())
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn rejection_surfaces_backend_message_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/appointments"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "time slot already booked"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri());
    let result = test_service(&config)
        .create_appointment(full_request())
        .await;

    assert_matches!(result, Err(BookingError::Rejected(msg)) if msg == "time slot already booked");
    // expect(1) verifies the POST was not blindly retried
}
