use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{bson::doc, Client, Collection};

use crate::dbs::mongo::models::MongoThread;
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

    /// Insert the thread unless one with the same id exists; returns the stored record
    pub async fn create_thread(&self, thread: MongoThread) -> Result<MongoThread> {
        if let Some(existing) = self.get_thread(&thread.id).await? {
            return Ok(existing);
        }

        match self.collection.insert_one(&thread).await {
            Ok(_) => Ok(thread),
            Err(e) => {
                // Lost a creation race: the winner's record is authoritative.
                match self.get_thread(&thread.id).await? {
                    Some(existing) => Ok(existing),
                    None => Err(e.into()),
                }
            }
        }
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Advance `updated_at` without ever moving it backwards
    pub async fn touch(&self, thread_id: &str, at: DateTime<Utc>) -> Result<()> {
        let filter = doc! { "_id": thread_id };
        let update = doc! {
            "$max": { "updated_at": bson::DateTime::from_chrono(at) }
        };
        self.collection.update_one(filter, update).await?;
        Ok(())
    }

    /// Ids of threads last updated before `cutoff`
    pub async fn expired_ids(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>> {
        let filter = doc! { "updated_at": { "$lt": bson::DateTime::from_chrono(cutoff) } };
        let threads: Vec<MongoThread> = self.collection.find(filter).await?.try_collect().await?;
        Ok(threads.into_iter().map(|t| t.id).collect())
    }

    pub async fn delete_many(&self, thread_ids: &[String]) -> Result<u64> {
        let filter = doc! { "_id": { "$in": thread_ids.to_vec() } };
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }
}
