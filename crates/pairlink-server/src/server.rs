//! HTTP server implementation using Axum.

use crate::handlers::{admin, health, pairing};
use crate::ws::ws_handler;
use crate::ApiError;
use axum::{
    routing::{get, post},
    Router,
};
use pairlink_core::{
    ChannelRelay, MemoryStore, PairingConfig, PairingManager, SessionStore, StoreConfig,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Session lifecycle (store records, registry, relay pushes)
    pub manager: Arc<PairingManager>,
    /// Per-connection outboxes drained by the WebSocket tasks
    pub relay: Arc<ChannelRelay>,
    /// Raw store handle for health probes
    pub store: Arc<dyn SessionStore>,
    /// Password checked by the admin reset endpoint
    pub admin_pass: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn SessionStore>,
        config: PairingConfig,
        admin_pass: impl Into<String>,
    ) -> Self {
        let relay = Arc::new(ChannelRelay::new());
        let manager = Arc::new(PairingManager::with_config(
            store.clone(),
            relay.clone(),
            config,
        ));
        Self {
            manager,
            relay,
            store,
            admin_pass: admin_pass.into(),
        }
    }
}

/// Build the router with all routes, CORS and request tracing.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let pairing_routes = Router::new()
        .route("/generate-code", get(pairing::generate_code))
        .route("/validate-code", post(pairing::validate_code))
        .route("/submit-link", post(pairing::submit_link))
        .route("/active-codes", get(pairing::active_codes));

    let admin_routes = Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/reset-codes", post(admin::reset_codes));

    Router::new()
        .nest("/api/pairing", pairing_routes)
        .nest("/api/admin", admin_routes)
        .route("/health", get(health::health))
        .route("/health/store", get(health::store_health))
        .route("/ws", get(ws_handler))
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Start the HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let app = create_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

/// Periodically drop expired entries from an in-memory store.
///
/// Reads already ignore expired entries; this only bounds memory.
pub fn spawn_purge_task(store: Arc<MemoryStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(StoreConfig::MEMORY_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            store.purge_expired().await;
        }
    })
}
