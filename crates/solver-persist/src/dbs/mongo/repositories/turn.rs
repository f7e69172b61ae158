use mongodb::{Client, Collection, bson::{self, doc, Document}};

use crate::dbs::mongo::repositories::is_duplicate_key;
use crate::error::Result;

/// Claims on keyed turns, one document per (owner, turn id)
#[derive(Clone)]
pub struct MongoTurnRepository {
    collection: Collection<Document>,
}

impl MongoTurnRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("turn_claims");
        Self { collection }
    }

    /// Claim a turn unless a claim younger than `stale_after_ms` exists.
    ///
    /// The upsert only matches a stale claim; a fresh one makes it try to
    /// insert a second document with the same `_id`, which the server rejects.
    pub async fn claim(&self, owner_id: &str, turn_id: &str, stale_after_ms: i64) -> Result<bool> {
        let now = bson::DateTime::now();
        let cutoff = bson::DateTime::from_millis(now.timestamp_millis() - stale_after_ms);

        let filter = doc! {
            "_id": { "owner_id": owner_id, "turn_id": turn_id },
            "claimed_at": { "$lt": cutoff },
        };
        let update = doc! { "$set": { "claimed_at": now } };

        match self.collection.update_one(filter, update).upsert(true).await {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
