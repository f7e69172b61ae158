use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{config::StorageBackend, state::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Always answers 200; a store that cannot be reached is reported as
/// `degraded` rather than failing the probe.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_name = match state.config.storage.backend {
        StorageBackend::Memory => "memory",
        StorageBackend::Mongodb => "mongodb",
    };

    let mut services = HashMap::new();
    let status = match state.store.ping().await {
        Ok(()) => {
            services.insert(store_name.to_string(), "connected".to_string());
            "healthy"
        }
        Err(e) => {
            tracing::warn!(error = %e, "Store ping failed");
            services.insert(store_name.to_string(), "disconnected".to_string());
            "degraded"
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
