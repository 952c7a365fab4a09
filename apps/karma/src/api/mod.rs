//! # Karma HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Ledger counts
//! - `POST /message` - Feed a chat line through the bot
//! - `GET /karma/top?limit=` - Highest receivers
//! - `GET /karma/bottom?limit=` - Lowest receivers
//! - `GET /karma/giver` - Most positive karma given
//! - `GET /karma/taker` - Most negative karma given
//! - `GET /karma/users/{user}` - One user's total
//! - `GET /transfers?limit=` - Most recent transfers
//! - `POST /export` - Export the ledger as a canonical snapshot
//!
//! ## Guards
//!
//! Configured in the `[server]` section (see [`ServerConfig`]):
//! - `api_key`: required on every route except `/health`
//! - `rate_limit`: global requests per second, 0 disables
//! - `cors_origins`: browser origins, loopback only by default

mod auth;
mod cors;
mod handlers;
mod rate_limit;
mod types;

pub use auth::{ApiKey, require_api_key};
pub use cors::cors_layer;
pub use handlers::{
    bottom_handler, export_handler, giver_handler, health_handler, message_handler,
    status_handler, taker_handler, top_handler, transfers_handler, user_handler,
};
pub use rate_limit::{GlobalRateLimiter, rate_limiter, throttle};
pub use types::{
    DEFAULT_TRANSFER_LIMIT, ExportResponse, HealthResponse, LeaderboardResponse, LimitParams,
    MAX_TRANSFER_LIMIT, MessageRequest, MessageResponse, ScoreResponse, StatusResponse,
    TransfersResponse, UserKarmaResponse,
};

use crate::chat::Bot;
use crate::config::ServerConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use karma_core::KarmaError;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (2 MiB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the bot and the ledger it owns.
///
/// The lock serializes ledger writes; reads share it.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<RwLock<Bot>>,
}

impl AppState {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self {
            bot: Arc::new(RwLock::new(bot)),
        }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and guards.
///
/// `/health` is public. Everything else is merged in from a protected router
/// that carries the API key guard when a key is configured. The rate limit,
/// body limit, CORS and tracing wrap both.
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let mut protected = Router::new()
        .route("/status", get(handlers::status_handler))
        .route("/message", post(handlers::message_handler))
        .route("/karma/top", get(handlers::top_handler))
        .route("/karma/bottom", get(handlers::bottom_handler))
        .route("/karma/giver", get(handlers::giver_handler))
        .route("/karma/taker", get(handlers::taker_handler))
        .route("/karma/users/{user}", get(handlers::user_handler))
        .route("/transfers", get(handlers::transfers_handler))
        .route("/export", post(handlers::export_handler));

    match server.api_key.clone().and_then(ApiKey::new) {
        Some(key) => {
            tracing::info!("API key authentication enabled");
            protected = protected.route_layer(from_fn_with_state(Arc::new(key), require_api_key));
        }
        None => tracing::warn!(
            "API key authentication disabled; set server.api_key or KARMA_API_KEY to enable it"
        ),
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .merge(protected);

    match rate_limiter(server.rate_limit) {
        Some(limiter) => {
            tracing::info!(per_second = server.rate_limit, "Rate limiting enabled");
            router = router.layer(from_fn_with_state(limiter, throttle));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(bot: Bot, server: &ServerConfig) -> Result<(), KarmaError> {
    let router = create_router(AppState::new(bot), server);
    let addr = format!("{}:{}", server.host, server.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| KarmaError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Karma HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| KarmaError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
