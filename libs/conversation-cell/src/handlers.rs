use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_cache::TtlCache;
use shared_models::error::AppError;

use crate::models::{InboundMessage, OutboundReplies};
use crate::services::engine::ConversationEngine;

/// Everything the chat surface needs, wired once at startup.
pub struct BotState {
    pub engine: ConversationEngine,
    pub cache: Arc<TtlCache>,
}

pub async fn receive_message(
    State(state): State<Arc<BotState>>,
    Json(message): Json<InboundMessage>,
) -> Result<Json<OutboundReplies>, AppError> {
    if message.from.trim().is_empty() {
        return Err(AppError::BadRequest("missing sender number".to_string()));
    }

    debug!("Inbound message from {}", message.from);
    let replies = state
        .engine
        .handle_message(message.from.trim(), &message.body)
        .await;

    Ok(Json(OutboundReplies { replies }))
}

pub async fn clear_cache(State(state): State<Arc<BotState>>) -> Json<Value> {
    state.cache.clear();
    info!("Cache cleared by admin request");
    Json(json!({ "success": true }))
}
