use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tether_types::{Attachment, Message, NewThread, StreamCheckpoint, Thread};

use crate::error::Result;

/// Trait for durable chat storage
///
/// Implementations must be safe under concurrent calls for different threads.
/// Calls for the same thread are sequenced by the engine.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create the thread if absent. An existing thread is returned unchanged.
    async fn create_thread(&self, thread: NewThread) -> Result<Thread>;

    /// Get a thread by ID
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Append a message and advance the owning thread's `updated_at`
    async fn save_message(&self, message: Message) -> Result<()>;

    /// All messages of a thread, in creation order
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Replace the thread's checkpoint
    async fn upsert_stream_state(&self, checkpoint: StreamCheckpoint) -> Result<()>;

    async fn get_stream_state(&self, thread_id: &str) -> Result<Option<StreamCheckpoint>>;

    async fn save_attachment(&self, attachment: Attachment) -> Result<()>;

    async fn get_attachment(&self, attachment_id: &str) -> Result<Option<Attachment>>;

    /// Delete every thread last updated before `cutoff`, with its messages,
    /// attachments and checkpoint. Returns the number of threads deleted.
    async fn prune_expired(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
