use std::sync::Arc;

use solver_core::Orchestrator;
use solver_persist::PersistenceClient;

use crate::config::Config;

/// Shared application state passed to all handlers
///
/// The Orchestrator holds no per-request state and is created once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn PersistenceClient>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: Config, orchestrator: Orchestrator) -> Self {
        Self {
            config: Arc::new(config),
            store: orchestrator.store().clone(),
            orchestrator: Arc::new(orchestrator),
        }
    }
}
