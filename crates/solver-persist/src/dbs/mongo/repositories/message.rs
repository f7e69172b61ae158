use mongodb::{
    Client, Collection, IndexModel,
    bson::{doc, oid::ObjectId, Document},
    options::IndexOptions,
};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoMessage;
use crate::dbs::mongo::repositories::{id_filter, is_duplicate_key};
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    fn raw(&self) -> Collection<Document> {
        self.collection.clone_with_type()
    }

    /// One message per (owner, turn, role); messages without a turn id are unconstrained
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "turn_id": 1, "role": 1 })
            .options(
                IndexOptions::builder()
                    .name("turn_role_unique".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "turn_id": { "$exists": true } })
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Save a single message
    pub async fn save_message(&self, message: &MongoMessage) -> Result<ObjectId> {
        match self.collection.insert_one(message).await {
            Ok(_) => Ok(message.id),
            Err(e) if is_duplicate_key(&e) => Err(PersistError::DuplicateTurn(
                message.turn_id.clone().unwrap_or_default(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all messages for a thread; `_id` breaks timestamp ties in insertion order
    pub async fn get_messages(&self, thread_id: &str) -> Result<Vec<Document>> {
        let messages = self.raw()
            .find(id_filter("thread_id", thread_id))
            .sort(doc! { "timestamp": 1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    /// Find the message a keyed turn wrote for a role
    pub async fn find_turn_message(
        &self,
        owner_id: &str,
        turn_id: &str,
        role: &str,
    ) -> Result<Option<Document>> {
        let filter = doc! { "owner_id": owner_id, "turn_id": turn_id, "role": role };
        Ok(self.raw().find_one(filter).await?)
    }
}
