use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, NewMessage, Thread};
use crate::timestamp::now_millis;
use crate::trait_client::PersistenceClient;

#[derive(Default)]
struct Store {
    threads: HashMap<String, Thread>,
    // Insertion order is the tie-breaker for equal timestamps
    messages: Vec<Message>,
    // (owner, turn id) -> claimed at, epoch millis
    claims: HashMap<(String, String), i64>,
}

/// Process-local store for development and tests
///
/// Every write completes under the lock before returning, so appends are
/// immediately visible to readers in the same process.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    store: RwLock<Store>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn create_thread(&self, owner_id: &str, title: &str, has_image: bool) -> Result<Thread> {
        let now = now_millis();
        let thread = Thread {
            id: Self::new_id(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            has_image,
            created_at: now,
            last_updated: now,
        };

        let mut store = self.store.write().await;
        store.threads.insert(thread.id.clone(), thread.clone());
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let store = self.store.read().await;
        Ok(store.threads.get(thread_id).cloned())
    }

    async fn touch_thread(&self, thread_id: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let thread = store
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        thread.last_updated = thread.last_updated.max(now_millis());
        Ok(())
    }

    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let thread = store
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        thread.title = title.to_string();
        Ok(())
    }

    async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<Thread>> {
        let store = self.store.read().await;
        let mut threads: Vec<Thread> = store
            .threads
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        threads.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        if let Some(limit) = limit {
            threads.truncate(limit.max(0) as usize);
        }
        Ok(threads)
    }

    async fn append_message(&self, message: NewMessage) -> Result<Message> {
        let mut store = self.store.write().await;

        if let Some(turn_id) = message.turn_id.as_deref() {
            let recorded = store.messages.iter().any(|m| {
                m.owner_id == message.owner_id
                    && m.role == message.role
                    && m.turn_id.as_deref() == Some(turn_id)
            });
            if recorded {
                return Err(PersistError::DuplicateTurn(turn_id.to_string()));
            }
        }

        // Keep per-thread timestamps non-decreasing even if the clock steps back
        let last_in_thread = store
            .messages
            .iter()
            .rev()
            .find(|m| m.thread_id == message.thread_id)
            .map(|m| m.timestamp);
        let timestamp = match last_in_thread {
            Some(last) => now_millis().max(last),
            None => now_millis(),
        };

        let stored = Message {
            id: Self::new_id(),
            thread_id: message.thread_id,
            owner_id: message.owner_id,
            role: message.role,
            content: message.content,
            image_url: message.image_url,
            timestamp,
            turn_id: message.turn_id,
        };
        store.messages.push(stored.clone());
        Ok(stored)
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let store = self.store.read().await;
        let mut messages: Vec<Message> = store
            .messages
            .iter()
            .filter(|m| m.thread_id == thread_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for ties
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn find_turn_message(
        &self,
        owner_id: &str,
        turn_id: &str,
        role: MessageRole,
    ) -> Result<Option<Message>> {
        let store = self.store.read().await;
        Ok(store
            .messages
            .iter()
            .find(|m| {
                m.owner_id == owner_id && m.role == role && m.turn_id.as_deref() == Some(turn_id)
            })
            .cloned())
    }

    async fn claim_turn(&self, owner_id: &str, turn_id: &str, stale_after_ms: i64) -> Result<bool> {
        let mut store = self.store.write().await;
        let now = now_millis();
        let key = (owner_id.to_string(), turn_id.to_string());

        let held = store
            .claims
            .get(&key)
            .is_some_and(|claimed_at| now - claimed_at < stale_after_ms);
        if held {
            return Ok(false);
        }
        store.claims.insert(key, now);
        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_sets_equal_timestamps() {
        let store = InMemoryPersistenceClient::new();
        let thread = store.create_thread("u1", "新對話", true).await.unwrap();

        assert_eq!(thread.created_at, thread.last_updated);
        assert!(thread.has_image);
        assert_eq!(store.get_thread(&thread.id).await.unwrap(), Some(thread));
    }

    #[tokio::test]
    async fn test_touch_missing_thread() {
        let store = InMemoryPersistenceClient::new();
        let err = store.touch_thread("nope").await.unwrap_err();
        assert!(matches!(err, PersistError::ThreadNotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_touch_is_monotonic() {
        let store = InMemoryPersistenceClient::new();
        let thread = store.create_thread("u1", "t", false).await.unwrap();

        store.touch_thread(&thread.id).await.unwrap();
        let first = store.get_thread(&thread.id).await.unwrap().unwrap().last_updated;
        store.touch_thread(&thread.id).await.unwrap();
        let second = store.get_thread(&thread.id).await.unwrap().unwrap().last_updated;

        assert!(first >= thread.created_at);
        assert!(second >= first);
    }

    #[tokio::test]
    async fn test_rename_missing_thread() {
        let store = InMemoryPersistenceClient::new();
        assert!(store.rename_thread("nope", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_messages_keep_insertion_order() {
        let store = InMemoryPersistenceClient::new();
        let thread = store.create_thread("u1", "t", false).await.unwrap();

        for i in 0..5 {
            store
                .append_message(NewMessage::user(&thread.id, "u1", format!("q{}", i)))
                .await
                .unwrap();
        }
        // Another thread's messages are not mixed in
        store
            .append_message(NewMessage::user("other", "u1", "elsewhere"))
            .await
            .unwrap();

        let messages = store.get_messages(&thread.id).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q0", "q1", "q2", "q3", "q4"]);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_empty_image_url_not_written() {
        let store = InMemoryPersistenceClient::new();
        let message = store
            .append_message(NewMessage::user("t1", "u1", "hi").with_image(Some("  ".to_string())))
            .await
            .unwrap();
        assert_eq!(message.image_url, None);
    }

    #[tokio::test]
    async fn test_list_threads_by_owner_most_recent_first() {
        let store = InMemoryPersistenceClient::new();
        let older = store.create_thread("u1", "older", false).await.unwrap();
        let newer = store.create_thread("u1", "newer", false).await.unwrap();
        store.create_thread("u2", "not mine", false).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.touch_thread(&older.id).await.unwrap();

        let threads = store.list_threads("u1", None).await.unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, older.id);
        assert_eq!(threads[1].id, newer.id);

        let limited = store.list_threads("u1", Some(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_find_turn_message() {
        let store = InMemoryPersistenceClient::new();
        store
            .append_message(
                NewMessage::user("t1", "u1", "q").with_turn_id(Some("turn-1".to_string())),
            )
            .await
            .unwrap();

        let found = store
            .find_turn_message("u1", "turn-1", MessageRole::User)
            .await
            .unwrap();
        assert!(found.is_some());

        let other_owner = store
            .find_turn_message("u2", "turn-1", MessageRole::User)
            .await
            .unwrap();
        assert!(other_owner.is_none());

        let assistant = store
            .find_turn_message("u1", "turn-1", MessageRole::Assistant)
            .await
            .unwrap();
        assert!(assistant.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_turn_append_rejected() {
        let store = InMemoryPersistenceClient::new();
        let keyed = || NewMessage::user("t1", "u1", "q").with_turn_id(Some("turn-1".to_string()));

        store.append_message(keyed()).await.unwrap();
        let err = store.append_message(keyed()).await.unwrap_err();
        assert!(matches!(err, PersistError::DuplicateTurn(id) if id == "turn-1"));

        // Same turn id for another owner is a different turn
        store
            .append_message(
                NewMessage::user("t2", "u2", "q").with_turn_id(Some("turn-1".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(store.get_messages("t1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_turn_is_exclusive_until_stale() {
        let store = InMemoryPersistenceClient::new();

        assert!(store.claim_turn("u1", "turn-1", 60_000).await.unwrap());
        assert!(!store.claim_turn("u1", "turn-1", 60_000).await.unwrap());
        assert!(store.claim_turn("u2", "turn-1", 60_000).await.unwrap());

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(store.claim_turn("u1", "turn-1", 1).await.unwrap());
    }
}
