use serde::{Deserialize, Serialize};

/// A stored chat message. Never mutated after the append that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub owner_id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: i64,
    /// Idempotency key of the turn that wrote this message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            _ => None,
        }
    }
}

/// Fields supplied by the caller on append; id and timestamp are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub thread_id: String,
    pub owner_id: String,
    pub role: MessageRole,
    pub content: String,
    pub image_url: Option<String>,
    pub turn_id: Option<String>,
}

impl NewMessage {
    pub fn user(
        thread_id: impl Into<String>,
        owner_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            owner_id: owner_id.into(),
            role: MessageRole::User,
            content: content.into(),
            image_url: None,
            turn_id: None,
        }
    }

    pub fn assistant(
        thread_id: impl Into<String>,
        owner_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: MessageRole::Assistant,
            ..Self::user(thread_id, owner_id, content)
        }
    }

    /// Attach an image reference. Empty strings are dropped so no blank
    /// image field is ever written.
    pub fn with_image(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|url| !url.trim().is_empty());
        self
    }

    pub fn with_turn_id(mut self, turn_id: Option<String>) -> Self {
        self.turn_id = turn_id;
        self
    }
}
