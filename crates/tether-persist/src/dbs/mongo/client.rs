use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::Client;
use tether_types::{Attachment, Message, NewThread, StreamCheckpoint, Thread};

use crate::dbs::mongo::models::{MongoAttachment, MongoMessage, MongoStreamState, MongoThread};
use crate::dbs::mongo::repositories::{
    MongoAttachmentRepository, MongoMessageRepository, MongoStreamStateRepository,
    MongoThreadRepository,
};
use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

pub struct MongoPersistenceClient {
    thread_repo: MongoThreadRepository,
    message_repo: MongoMessageRepository,
    stream_repo: MongoStreamStateRepository,
    attachment_repo: MongoAttachmentRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        tracing::info!(database, "Connected to MongoDB");

        Ok(Self {
            thread_repo: MongoThreadRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
            stream_repo: MongoStreamStateRepository::new(&client, database),
            attachment_repo: MongoAttachmentRepository::new(&client, database),
        })
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_thread(&self, thread: NewThread) -> Result<Thread> {
        let mongo_thread: MongoThread = thread.into_thread().into();
        let stored = self.thread_repo.create_thread(mongo_thread).await?;
        Ok(stored.into())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let thread = self.thread_repo.get_thread(thread_id).await?;
        Ok(thread.map(Into::into))
    }

    async fn save_message(&self, message: Message) -> Result<()> {
        let created_at = message.created_at;
        let mongo_message: MongoMessage = message.into();

        self.message_repo.save_message(&mongo_message).await?;
        self.thread_repo.touch(&mongo_message.thread_id, created_at).await?;
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        let messages = self.message_repo.get_messages(thread_id).await?;
        Ok(messages.into_iter().map(Into::into).collect())
    }

    async fn upsert_stream_state(&self, checkpoint: StreamCheckpoint) -> Result<()> {
        let state: MongoStreamState = checkpoint.into();
        self.stream_repo.upsert(&state).await
    }

    async fn get_stream_state(&self, thread_id: &str) -> Result<Option<StreamCheckpoint>> {
        let state = self.stream_repo.get(thread_id).await?;
        Ok(state.map(Into::into))
    }

    async fn save_attachment(&self, attachment: Attachment) -> Result<()> {
        let attachment: MongoAttachment = attachment.into();
        self.attachment_repo.save(&attachment).await
    }

    async fn get_attachment(&self, attachment_id: &str) -> Result<Option<Attachment>> {
        let attachment = self.attachment_repo.get(attachment_id).await?;
        Ok(attachment.map(Into::into))
    }

    async fn prune_expired(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let expired = self.thread_repo.expired_ids(cutoff).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        self.message_repo.delete_for_threads(&expired).await?;
        self.attachment_repo.delete_for_threads(&expired).await?;
        self.stream_repo.delete_for_threads(&expired).await?;
        let deleted = self.thread_repo.delete_many(&expired).await?;

        tracing::info!(deleted, %cutoff, "Pruned expired threads");
        Ok(deleted as usize)
    }
}
