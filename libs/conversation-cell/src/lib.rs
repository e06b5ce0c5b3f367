pub mod handlers;
pub mod messages;
pub mod models;
pub mod router;
pub mod services;

pub use handlers::BotState;
pub use models::{ConversationSession, ConversationState, FlowKind};
pub use services::engine::ConversationEngine;
pub use services::session::{InMemorySessionStore, SessionStore};
