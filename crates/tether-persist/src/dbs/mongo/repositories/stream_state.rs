use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoStreamState;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoStreamStateRepository {
    collection: Collection<MongoStreamState>,
}

impl MongoStreamStateRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("stream_states");
        Self { collection }
    }

    pub async fn upsert(&self, state: &MongoStreamState) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": state.thread_id.as_str() }, state)
            .upsert(true)
            .await?;
        Ok(())
    }

    pub async fn get(&self, thread_id: &str) -> Result<Option<MongoStreamState>> {
        Ok(self.collection.find_one(doc! { "_id": thread_id }).await?)
    }

    pub async fn delete_for_threads(&self, thread_ids: &[String]) -> Result<()> {
        self.collection
            .delete_many(doc! { "_id": { "$in": thread_ids.to_vec() } })
            .await?;
        Ok(())
    }
}
