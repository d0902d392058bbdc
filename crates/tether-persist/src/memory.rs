use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tether_types::{Attachment, Message, NewThread, StreamCheckpoint, Thread};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::trait_client::PersistenceClient;

#[derive(Default)]
struct Store {
    threads: HashMap<String, Thread>,
    messages: HashMap<String, Vec<Message>>,
    stream_states: HashMap<String, StreamCheckpoint>,
    attachments: HashMap<String, Attachment>,
}

/// Process-local storage. Used by tests and the default server configuration.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    store: RwLock<Store>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn thread_count(&self) -> usize {
        self.store.read().await.threads.len()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn create_thread(&self, thread: NewThread) -> Result<Thread> {
        let mut store = self.store.write().await;
        let thread = store
            .threads
            .entry(thread.id.clone())
            .or_insert_with(|| thread.into_thread());
        Ok(thread.clone())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        Ok(self.store.read().await.threads.get(thread_id).cloned())
    }

    async fn save_message(&self, message: Message) -> Result<()> {
        let mut store = self.store.write().await;

        if let Some(thread) = store.threads.get_mut(&message.thread_id) {
            thread.touch(message.created_at);
        }

        store
            .messages
            .entry(message.thread_id.clone())
            .or_default()
            .push(message);
        Ok(())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .store
            .read()
            .await
            .messages
            .get(thread_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_stream_state(&self, checkpoint: StreamCheckpoint) -> Result<()> {
        self.store
            .write()
            .await
            .stream_states
            .insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn get_stream_state(&self, thread_id: &str) -> Result<Option<StreamCheckpoint>> {
        Ok(self.store.read().await.stream_states.get(thread_id).cloned())
    }

    async fn save_attachment(&self, attachment: Attachment) -> Result<()> {
        self.store
            .write()
            .await
            .attachments
            .insert(attachment.id.clone(), attachment);
        Ok(())
    }

    async fn get_attachment(&self, attachment_id: &str) -> Result<Option<Attachment>> {
        Ok(self.store.read().await.attachments.get(attachment_id).cloned())
    }

    async fn prune_expired(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut store = self.store.write().await;

        let expired: Vec<String> = store
            .threads
            .values()
            .filter(|thread| thread.updated_at < cutoff)
            .map(|thread| thread.id.clone())
            .collect();

        for thread_id in &expired {
            store.threads.remove(thread_id);
            store.messages.remove(thread_id);
            store.stream_states.remove(thread_id);
        }
        store
            .attachments
            .retain(|_, attachment| !expired.contains(&attachment.thread_id));

        tracing::debug!(deleted = expired.len(), %cutoff, "Pruned expired threads");
        Ok(expired.len())
    }
}
