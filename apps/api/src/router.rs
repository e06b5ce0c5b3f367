use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use conversation_cell::router::conversation_routes;
use conversation_cell::BotState;

pub fn create_router(state: Arc<BotState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Turnero bot API is running!" }))
        .route(
            "/health",
            get(|| async { Json(json!({ "status": "ok" })) }),
        )
        .nest("/v1", conversation_routes(state))
}
