pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::logging;
use crate::routes::{health, messages, threads, turns};
use crate::state::AppState;

/// Build the HTTP router with all routes and middleware
pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Turns
        .route("/solver/turns", post(turns::submit_turn))
        // Threads
        .route("/threads", get(threads::list_threads))
        .route("/threads/:thread_id", put(threads::rename_thread))
        // Messages
        .route("/threads/:thread_id/messages", get(messages::list_messages));

    // Turns wait on the model for as long as it takes; no server-side timeout
    let router = api_routes
        .layer(axum_middleware::from_fn(logging::log_request))
        .layer(CompressionLayer::new());

    let router = match build_cors_layer(&state.config) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `None` when CORS is disabled: no cross-origin headers are sent at all
fn build_cors_layer(config: &Config) -> Option<CorsLayer> {
    if !config.cors.enabled {
        return None;
    }

    let cors = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        Some(cors.allow_origin(Any))
    } else {
        let parsed_origins: Vec<axum::http::HeaderValue> = config
            .cors
            .origins
            .iter()
            .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
            .collect();

        Some(cors.allow_origin(parsed_origins))
    }
}
