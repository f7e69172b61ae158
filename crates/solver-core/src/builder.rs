use std::sync::Arc;
use std::time::Duration;

use solver_llm::ChatClient;
use solver_persist::PersistenceClient;

use crate::config::{RouteProfile, TitleProfile};
use crate::error::{Result, SolverError};
use crate::orchestrator::Orchestrator;
use crate::router::SubjectRouter;
use crate::summarizer::TitleSummarizer;
use crate::templates::{GENERAL_SYSTEM_PROMPT, QUANTITATIVE_SYSTEM_PROMPT};

/// Builder for constructing an Orchestrator
pub struct OrchestratorBuilder {
    store: Option<Arc<dyn PersistenceClient>>,
    chat_client: Option<Arc<dyn ChatClient>>,
    general: RouteProfile,
    quantitative: RouteProfile,
    title: TitleProfile,
    turn_lease: Option<Duration>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            chat_client: None,
            general: RouteProfile::general(),
            quantitative: RouteProfile::quantitative(),
            title: TitleProfile::default(),
            turn_lease: None,
        }
    }

    /// Set the thread and message store
    pub fn store(mut self, store: Arc<dyn PersistenceClient>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the model client shared by routing and summarization
    pub fn chat_client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.chat_client = Some(client);
        self
    }

    pub fn general(mut self, profile: RouteProfile) -> Self {
        self.general = profile;
        self
    }

    pub fn quantitative(mut self, profile: RouteProfile) -> Self {
        self.quantitative = profile;
        self
    }

    pub fn title(mut self, profile: TitleProfile) -> Self {
        self.title = profile;
        self
    }

    /// How long a keyed turn stays claimed by the attempt running it
    pub fn turn_lease(mut self, lease: Duration) -> Self {
        self.turn_lease = Some(lease);
        self
    }

    /// Build the Orchestrator. Empty prompts fall back to the built-in ones.
    pub fn build(self) -> Result<Orchestrator> {
        let store = self
            .store
            .ok_or_else(|| SolverError::Unknown("store is required".to_string()))?;
        let client = self
            .chat_client
            .ok_or_else(|| SolverError::Unknown("chat client is required".to_string()))?;

        let router = SubjectRouter::new(
            client.clone(),
            self.general.or_prompt(GENERAL_SYSTEM_PROMPT),
            self.quantitative.or_prompt(QUANTITATIVE_SYSTEM_PROMPT),
        );
        let summarizer = TitleSummarizer::new(client, self.title);

        let orchestrator = Orchestrator::new(store, router, summarizer);
        Ok(match self.turn_lease {
            Some(lease) => orchestrator.with_turn_lease(lease),
            None => orchestrator,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
