use mongodb::{Client, bson::{self, doc, oid::ObjectId}};
use async_trait::async_trait;

use crate::trait_client::PersistenceClient;
use crate::models::{Message, MessageRole, NewMessage, Thread};
use crate::dbs::mongo::models::{
    decode_all, message_from_document, thread_from_document, MongoMessage, MongoThread,
};
use crate::dbs::mongo::repositories::{
    id_value, MongoMessageRepository, MongoThreadRepository, MongoTurnRepository,
};
use crate::error::{Result, PersistError};

pub struct MongoPersistenceClient {
    client: Client,
    database: String,
    message_repo: MongoMessageRepository,
    thread_repo: MongoThreadRepository,
    turn_repo: MongoTurnRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB, create client and ensure indexes
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let message_repo = MongoMessageRepository::new(&client, database);
        let thread_repo = MongoThreadRepository::new(&client, database);
        let turn_repo = MongoTurnRepository::new(&client, database);

        message_repo.ensure_indexes().await?;

        Ok(Self {
            client,
            database: database.to_string(),
            message_repo,
            thread_repo,
            turn_repo,
        })
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_thread(&self, owner_id: &str, title: &str, has_image: bool) -> Result<Thread> {
        let now = bson::DateTime::now();
        let thread = MongoThread {
            id: ObjectId::new(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            has_image,
            created_at: now,
            last_updated: now,
        };

        self.thread_repo.insert_thread(&thread).await?;
        Ok(thread.into())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        match self.thread_repo.get_thread(thread_id).await? {
            Some(doc) => Ok(Some(thread_from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn touch_thread(&self, thread_id: &str) -> Result<()> {
        if !self.thread_repo.touch_thread(thread_id).await? {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }

    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<()> {
        if !self.thread_repo.rename_thread(thread_id, title).await? {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }

    async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<Thread>> {
        let docs = self.thread_repo.list_threads(owner_id, limit).await?;
        Ok(decode_all(docs, "thread", thread_from_document))
    }

    async fn append_message(&self, message: NewMessage) -> Result<Message> {
        let mongo_message = MongoMessage {
            id: ObjectId::new(),
            thread_id: id_value(&message.thread_id),
            owner_id: message.owner_id,
            role: message.role,
            content: message.content,
            image_url: message.image_url,
            timestamp: bson::DateTime::now(),
            turn_id: message.turn_id,
        };

        self.message_repo.save_message(&mongo_message).await?;
        Ok(mongo_message.into())
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let docs = self.message_repo.get_messages(thread_id).await?;
        Ok(decode_all(docs, "message", message_from_document))
    }

    async fn find_turn_message(
        &self,
        owner_id: &str,
        turn_id: &str,
        role: MessageRole,
    ) -> Result<Option<Message>> {
        match self.message_repo.find_turn_message(owner_id, turn_id, role.as_str()).await? {
            Some(doc) => Ok(Some(message_from_document(&doc)?)),
            None => Ok(None),
        }
    }

    async fn claim_turn(&self, owner_id: &str, turn_id: &str, stale_after_ms: i64) -> Result<bool> {
        self.turn_repo.claim(owner_id, turn_id, stale_after_ms).await
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
