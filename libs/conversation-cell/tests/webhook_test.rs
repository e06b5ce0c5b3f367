use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::MockServer;

use appointment_cell::{AvailabilityService, BookingService};
use conversation_cell::router::conversation_routes;
use conversation_cell::{BotState, ConversationEngine, InMemorySessionStore, SessionStore};
use shared_backend::{BackendClient, RetryPolicy};
use shared_cache::TtlCache;
use shared_config::AppConfig;
use sobreturno_cell::SobreturnoService;

fn bot_state(backend_url: &str) -> Arc<BotState> {
    let config = AppConfig {
        backend_url: backend_url.to_string(),
        chatbot_api_key: "test-key".to_string(),
        ..AppConfig::default()
    };

    let backend = Arc::new(BackendClient::new(&config));
    let cache = Arc::new(TtlCache::new());
    let retry = RetryPolicy::with_backoff(3, Duration::from_millis(1), Duration::from_millis(1));

    let availability = Arc::new(
        AvailabilityService::new(&config, backend.clone(), cache.clone())
            .with_retry_policy(retry.clone()),
    );
    let booking = Arc::new(BookingService::new(&config, backend.clone()));
    let sobreturnos =
        Arc::new(SobreturnoService::new(&config, backend, cache.clone()).with_retry_policy(retry));
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    Arc::new(BotState {
        engine: ConversationEngine::new(&config, availability, booking, sobreturnos, sessions),
        cache,
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid test request")
}

#[tokio::test]
async fn inbound_message_returns_replies() {
    let server = MockServer::start().await;
    let app = conversation_routes(bot_state(&server.uri()));

    let response = app
        .oneshot(post_json(
            "/messages",
            json!({"from": "5493704111222", "body": "hola"}),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    let payload: Value = serde_json::from_slice(&bytes).expect("json body");

    let replies = payload["replies"].as_array().expect("replies array");
    assert!(!replies.is_empty());
    assert!(replies[0]
        .as_str()
        .expect("string reply")
        .contains("Bienvenido"));
}

#[tokio::test]
async fn blank_sender_is_a_bad_request() {
    let server = MockServer::start().await;
    let app = conversation_routes(bot_state(&server.uri()));

    let response = app
        .oneshot(post_json("/messages", json!({"from": "  ", "body": "hola"})))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cache_clear_reports_success() {
    let server = MockServer::start().await;
    let state = bot_state(&server.uri());
    state.cache.set_default("appointments_2099-01-14", &1u32);
    let app = conversation_routes(state.clone());

    let response = app
        .oneshot(post_json("/cache/clear", json!({})))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.cache.keys().is_empty());
}
