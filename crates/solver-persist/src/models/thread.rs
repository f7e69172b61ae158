use serde::{Deserialize, Serialize};

/// One persisted conversation
///
/// Timestamps are epoch milliseconds. `owner_id`, `has_image` and
/// `created_at` never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub has_image: bool,
    pub created_at: i64,
    pub last_updated: i64,
}

impl Thread {
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}
