use std::sync::Arc;

use axum::{routing::post, Router};

use crate::handlers::{self, BotState};

pub fn conversation_routes(state: Arc<BotState>) -> Router {
    Router::new()
        .route("/messages", post(handlers::receive_message))
        .route("/cache/clear", post(handlers::clear_cache))
        .with_state(state)
}
