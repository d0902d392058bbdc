use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoAttachment;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoAttachmentRepository {
    collection: Collection<MongoAttachment>,
}

impl MongoAttachmentRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("attachments");
        Self { collection }
    }

    pub async fn save(&self, attachment: &MongoAttachment) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": attachment.id.as_str() }, attachment)
            .upsert(true)
            .await?;
        Ok(())
    }

    pub async fn get(&self, attachment_id: &str) -> Result<Option<MongoAttachment>> {
        Ok(self.collection.find_one(doc! { "_id": attachment_id }).await?)
    }

    pub async fn delete_for_threads(&self, thread_ids: &[String]) -> Result<()> {
        self.collection
            .delete_many(doc! { "thread_id": { "$in": thread_ids.to_vec() } })
            .await?;
        Ok(())
    }
}
