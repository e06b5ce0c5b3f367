use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::{AvailabilityService, BookingService};
use conversation_cell::{BotState, ConversationEngine, InMemorySessionStore, SessionStore};
use shared_backend::BackendClient;
use shared_cache::TtlCache;
use shared_config::AppConfig;
use sobreturno_cell::SobreturnoService;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Turnero bot API server");

    // Load configuration
    let config = AppConfig::from_env();
    let http_port = config.http_port;

    // One backend client and one cache, shared by every service
    let backend = Arc::new(BackendClient::new(&config));
    let cache = Arc::new(TtlCache::new());

    let availability = Arc::new(AvailabilityService::new(
        &config,
        backend.clone(),
        cache.clone(),
    ));
    let booking = Arc::new(BookingService::new(&config, backend.clone()));
    let sobreturnos = Arc::new(SobreturnoService::new(&config, backend, cache.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let state = Arc::new(BotState {
        engine: ConversationEngine::new(&config, availability, booking, sobreturnos, sessions),
        cache,
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    }
}
