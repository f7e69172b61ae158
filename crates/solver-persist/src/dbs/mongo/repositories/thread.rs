use mongodb::{Client, Collection, bson::{self, doc, Document}};
use futures::TryStreamExt;

use crate::dbs::mongo::models::MongoThread;
use crate::dbs::mongo::repositories::id_filter;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    /// Raw view used for reads so older document shapes can be normalized
    fn raw(&self) -> Collection<Document> {
        self.collection.clone_with_type()
    }

    /// Insert a new thread
    pub async fn insert_thread(&self, thread: &MongoThread) -> Result<()> {
        self.collection.insert_one(thread).await?;
        Ok(())
    }

    /// Get thread by ID (ObjectId or legacy string)
    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<Document>> {
        Ok(self.raw().find_one(id_filter("_id", thread_id)).await?)
    }

    /// List threads for an owner, most recently updated first
    pub async fn list_threads(&self, owner_id: &str, limit: Option<i64>) -> Result<Vec<Document>> {
        let raw = self.raw();
        let mut find = raw
            .find(doc! { "owner_id": owner_id })
            .sort(doc! { "last_updated": -1, "_id": -1 });

        if let Some(limit) = limit {
            find = find.limit(limit);
        }

        let threads = find
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }

    /// Touch thread. `$max` keeps `last_updated` from moving backwards.
    /// Returns whether a thread matched.
    pub async fn touch_thread(&self, thread_id: &str) -> Result<bool> {
        let update = doc! { "$max": { "last_updated": bson::DateTime::now() } };
        let result = self.collection.update_one(id_filter("_id", thread_id), update).await?;
        Ok(result.matched_count > 0)
    }

    /// Set a new title. Returns whether a thread matched.
    pub async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<bool> {
        let update = doc! { "$set": { "title": title } };
        let result = self.collection.update_one(id_filter("_id", thread_id), update).await?;
        Ok(result.matched_count > 0)
    }
}
