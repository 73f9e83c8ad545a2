//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, get_handler, health_handler, invalidate_handler,
    proxy_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /get?key=` - Read a shared store entry
/// - `POST /set` - Write a shared store entry
/// - `POST /delete` - Delete shared store entries
/// - `POST /clear` - Drop every shared store entry
/// - `GET /stats` - Shared store statistics
/// - `POST /invalidate` - Content-change trigger (bearer token)
/// - `GET /cms/*path` - Read-through proxy to the CMS API
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get", get(get_handler))
        .route("/set", post(set_handler))
        .route("/delete", post(delete_handler))
        .route("/clear", post(clear_handler))
        .route("/stats", get(stats_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/cms/*path", get(proxy_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
