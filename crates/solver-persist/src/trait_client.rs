use async_trait::async_trait;

use crate::models::{Message, MessageRole, NewMessage, Thread};
use crate::error::Result;

/// Trait for the document store holding threads and messages
///
/// Implementations must make each write durable before returning and must
/// let `get_messages` observe every completed append for that thread.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a new thread; both timestamps are set to the same "now"
    async fn create_thread(&self, owner_id: &str, title: &str, has_image: bool) -> Result<Thread>;

    /// Get a thread by ID
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Bump `last_updated` to now (never backwards). `ThreadNotFound` if missing.
    async fn touch_thread(&self, thread_id: &str) -> Result<()>;

    /// Replace the title. `ThreadNotFound` if missing.
    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<()>;

    /// Threads owned by a user, most recently updated first
    async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<Thread>>;

    /// Append a message; id and timestamp are assigned at write time.
    /// `DuplicateTurn` if the turn already has a message for this role.
    async fn append_message(&self, message: NewMessage) -> Result<Message>;

    /// All messages for a thread, ascending by timestamp (insertion order on ties)
    async fn get_messages(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Look up the message a keyed turn wrote for the given role
    async fn find_turn_message(
        &self,
        owner_id: &str,
        turn_id: &str,
        role: MessageRole,
    ) -> Result<Option<Message>>;

    /// Atomically claim a keyed turn for processing.
    ///
    /// Returns `false` while another claim younger than `stale_after_ms` is
    /// held; an older claim is taken over so a crashed attempt can be resumed.
    async fn claim_turn(&self, owner_id: &str, turn_id: &str, stale_after_ms: i64) -> Result<bool>;

    /// Cheap reachability check
    async fn ping(&self) -> Result<()>;
}
