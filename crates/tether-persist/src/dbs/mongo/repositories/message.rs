use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    pub async fn save_message(&self, message: &MongoMessage) -> Result<()> {
        self.collection.insert_one(message).await?;
        Ok(())
    }

    /// All messages for a thread, oldest first
    pub async fn get_messages(&self, thread_id: &str) -> Result<Vec<MongoMessage>> {
        let filter = doc! { "thread_id": thread_id };
        let messages = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(messages)
    }

    pub async fn delete_for_threads(&self, thread_ids: &[String]) -> Result<()> {
        self.collection
            .delete_many(doc! { "thread_id": { "$in": thread_ids.to_vec() } })
            .await?;
        Ok(())
    }
}
