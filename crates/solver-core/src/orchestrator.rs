use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use solver_persist::{Message, MessageRole, NewMessage, PersistError, PersistenceClient, Thread};

use crate::builder::OrchestratorBuilder;
use crate::error::{Result, SolverError};
use crate::router::{PriorTurn, SubjectRouter};
use crate::subject::SubjectHint;
use crate::summarizer::{TitleSummarizer, MAX_TITLE_CHARS};

/// Title of a thread until its first reply has been summarized
pub const PLACEHOLDER_TITLE: &str = "新的解題對話";

/// How long a keyed turn stays claimed before a retry may take it over
pub const DEFAULT_TURN_LEASE: Duration = Duration::from_secs(120);

/// One user turn as submitted by a client
#[derive(Debug, Clone, Default)]
pub struct TurnRequest {
    pub owner_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub thread_id: Option<String>,
    pub is_new_thread: bool,
    pub subject_hint: Option<String>,
    /// Client-generated idempotency key
    pub turn_id: Option<String>,
}

impl TurnRequest {
    /// A turn that starts a new thread
    pub fn new(owner_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            content: content.into(),
            is_new_thread: true,
            ..Default::default()
        }
    }

    /// Continue an existing thread
    pub fn in_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self.is_new_thread = false;
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_subject(mut self, subject_hint: impl Into<String>) -> Self {
        self.subject_hint = Some(subject_hint.into());
        self
    }

    pub fn with_turn_id(mut self, turn_id: impl Into<String>) -> Self {
        self.turn_id = Some(turn_id.into());
        self
    }

    fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(SolverError::InvalidRequest("ownerId is required".to_string()));
        }
        if self.content.trim().is_empty() {
            return Err(SolverError::InvalidRequest("content is required".to_string()));
        }
        Ok(())
    }

    fn existing_thread_id(&self) -> Option<&str> {
        if self.is_new_thread {
            return None;
        }
        self.thread_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    fn image(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    fn turn_key(&self) -> Option<&str> {
        self.turn_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Result of a completed turn
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub reply: String,
    pub thread_id: String,
    pub is_new_thread: bool,
    /// Full ordered history of the thread, ending with this turn's reply
    pub messages: Vec<Message>,
    /// The reply was served from an earlier attempt with the same turn id
    pub replayed: bool,
}

/// Drives a single homework turn: thread bookkeeping, persistence,
/// model routing and title summarization.
pub struct Orchestrator {
    store: Arc<dyn PersistenceClient>,
    router: SubjectRouter,
    summarizer: TitleSummarizer,
    turn_lease: Duration,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn PersistenceClient>,
        router: SubjectRouter,
        summarizer: TitleSummarizer,
    ) -> Self {
        Self {
            store,
            router,
            summarizer,
            turn_lease: DEFAULT_TURN_LEASE,
        }
    }

    pub fn with_turn_lease(mut self, turn_lease: Duration) -> Self {
        self.turn_lease = turn_lease;
        self
    }

    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn PersistenceClient> {
        &self.store
    }

    /// Process one user turn and return the assistant reply with the
    /// thread's history.
    ///
    /// The user message is always persisted before the model is called,
    /// and the assistant message before this returns. Model failures turn
    /// into a stored apology; title failures are logged and ignored.
    ///
    /// A turn with a `turn_id` runs at most once per owner: a completed
    /// turn is replayed and a retry racing a running attempt gets `Conflict`.
    pub async fn submit_turn(&self, request: TurnRequest) -> Result<TurnOutcome> {
        request.validate()?;
        let subject = request.subject_hint.as_deref().and_then(SubjectHint::parse);

        match request.turn_key() {
            Some(turn_id) => self.submit_keyed_turn(&request, turn_id, subject).await,
            None => self.start_turn(&request, subject).await,
        }
    }

    async fn submit_keyed_turn(
        &self,
        request: &TurnRequest,
        turn_id: &str,
        subject: Option<SubjectHint>,
    ) -> Result<TurnOutcome> {
        if let Some(outcome) = self.replay_turn(&request.owner_id, turn_id).await? {
            return Ok(outcome);
        }

        let lease_ms = i64::try_from(self.turn_lease.as_millis()).unwrap_or(i64::MAX);
        if !self.store.claim_turn(&request.owner_id, turn_id, lease_ms).await? {
            // The running attempt may have finished since the first lookup
            if let Some(outcome) = self.replay_turn(&request.owner_id, turn_id).await? {
                return Ok(outcome);
            }
            tracing::info!(owner_id = %request.owner_id, turn_id = %turn_id, "Turn already in progress");
            return Err(SolverError::Conflict(turn_id.to_string()));
        }

        let Some(user_message) = self
            .store
            .find_turn_message(&request.owner_id, turn_id, MessageRole::User)
            .await?
        else {
            return self.start_turn(request, subject).await;
        };

        // The earlier attempt stopped after storing the user message
        let thread = self.owned_thread(&user_message.thread_id, &request.owner_id).await?;
        let history = self.store.get_messages(&thread.id).await?;
        let is_new_thread = history
            .first()
            .is_some_and(|first| first.id == user_message.id);
        tracing::info!(thread_id = %thread.id, turn_id = %turn_id, "Resuming interrupted turn");

        self.complete_turn(request, subject, &thread.id, &user_message, is_new_thread)
            .await
    }

    /// Outcome of a keyed turn whose reply is already stored
    async fn replay_turn(&self, owner_id: &str, turn_id: &str) -> Result<Option<TurnOutcome>> {
        let Some(reply) = self
            .store
            .find_turn_message(owner_id, turn_id, MessageRole::Assistant)
            .await?
        else {
            return Ok(None);
        };

        let thread = self.owned_thread(&reply.thread_id, owner_id).await?;
        tracing::info!(thread_id = %thread.id, turn_id = %turn_id, "Replaying completed turn");
        let messages = self.store.get_messages(&thread.id).await?;

        Ok(Some(TurnOutcome {
            reply: reply.content,
            thread_id: thread.id,
            is_new_thread: false,
            messages,
            replayed: true,
        }))
    }

    /// Resolve or create the thread, store the user message, then answer
    async fn start_turn(&self, request: &TurnRequest, subject: Option<SubjectHint>) -> Result<TurnOutcome> {
        let (thread, is_new_thread) = match request.existing_thread_id() {
            Some(thread_id) => {
                let thread = self.owned_thread(thread_id, &request.owner_id).await?;
                self.store.touch_thread(&thread.id).await?;
                (thread, false)
            }
            None => {
                let thread = self
                    .store
                    .create_thread(&request.owner_id, PLACEHOLDER_TITLE, request.image().is_some())
                    .await?;
                tracing::info!(thread_id = %thread.id, owner_id = %request.owner_id, "Created thread");
                (thread, true)
            }
        };

        let user_message = self
            .store
            .append_message(
                NewMessage::user(&thread.id, &request.owner_id, &request.content)
                    .with_image(request.image_url.clone())
                    .with_turn_id(request.turn_key().map(str::to_string)),
            )
            .await?;

        self.complete_turn(request, subject, &thread.id, &user_message, is_new_thread)
            .await
    }

    /// Steps after the user message is stored: route, persist reply, title
    async fn complete_turn(
        &self,
        request: &TurnRequest,
        subject: Option<SubjectHint>,
        thread_id: &str,
        user_message: &Message,
        is_new_thread: bool,
    ) -> Result<TurnOutcome> {
        let mut messages = self.store.get_messages(thread_id).await?;
        let prior_turns: Vec<PriorTurn> = messages
            .iter()
            .filter(|m| m.id != user_message.id && !m.content.trim().is_empty())
            .map(|m| PriorTurn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let reply = self
            .router
            .answer(subject, prior_turns, &user_message.content, user_message.image_url.as_deref())
            .await;

        let appended = self
            .store
            .append_message(
                NewMessage::assistant(thread_id, &request.owner_id, &reply)
                    .with_turn_id(user_message.turn_id.clone()),
            )
            .await;
        let assistant_message = match appended {
            Ok(message) => message,
            // A concurrent attempt stored its reply first
            Err(PersistError::DuplicateTurn(turn_id)) => {
                return match self.replay_turn(&request.owner_id, &turn_id).await? {
                    Some(outcome) => Ok(outcome),
                    None => Err(SolverError::Conflict(turn_id)),
                };
            }
            Err(e) => return Err(e.into()),
        };
        messages.push(assistant_message);

        if is_new_thread {
            let title = self.summarizer.summarize(&reply, subject).await;
            match self.store.rename_thread(thread_id, &title).await {
                Ok(()) => tracing::debug!(thread_id = %thread_id, title = %title, "Titled thread"),
                Err(e) => tracing::warn!(thread_id = %thread_id, error = %e, "Failed to store thread title"),
            }
        }

        Ok(TurnOutcome {
            reply,
            thread_id: thread_id.to_string(),
            is_new_thread,
            messages,
            replayed: false,
        })
    }

    /// Threads owned by a user, most recently updated first.
    /// Without a limit every thread is returned.
    pub async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<Thread>> {
        if owner_id.trim().is_empty() {
            return Err(SolverError::InvalidRequest("ownerId is required".to_string()));
        }
        if limit.is_some_and(|limit| limit < 1) {
            return Err(SolverError::InvalidRequest("limit must be at least 1".to_string()));
        }

        Ok(self.store.list_threads(owner_id, limit).await?)
    }

    /// Ordered messages of a thread the caller owns
    pub async fn list_messages(&self, thread_id: &str, owner_id: &str) -> Result<Vec<Message>> {
        if owner_id.trim().is_empty() {
            return Err(SolverError::InvalidRequest("ownerId is required".to_string()));
        }
        let thread = self.owned_thread(thread_id, owner_id).await?;
        Ok(self.store.get_messages(&thread.id).await?)
    }

    /// User-initiated rename. Returns the stored (trimmed) title.
    pub async fn rename_thread(&self, thread_id: &str, owner_id: &str, new_title: &str) -> Result<String> {
        if owner_id.trim().is_empty() {
            return Err(SolverError::InvalidRequest("ownerId is required".to_string()));
        }
        let title = new_title.trim();
        if title.is_empty() {
            return Err(SolverError::InvalidRequest("newTitle must not be empty".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(SolverError::InvalidRequest(format!(
                "newTitle must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        let thread = self.owned_thread(thread_id, owner_id).await?;
        self.store.rename_thread(&thread.id, title).await?;
        tracing::info!(thread_id = %thread.id, "Renamed thread");
        Ok(title.to_string())
    }

    async fn owned_thread(&self, thread_id: &str, owner_id: &str) -> Result<Thread> {
        let thread = self
            .store
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| SolverError::NotFound(thread_id.to_string()))?;

        if !thread.is_owned_by(owner_id) {
            tracing::warn!(thread_id = %thread_id, owner_id = %owner_id, "Ownership check failed");
            return Err(SolverError::Forbidden(format!(
                "thread {} does not belong to {}",
                thread_id, owner_id
            )));
        }
        Ok(thread)
    }
}
