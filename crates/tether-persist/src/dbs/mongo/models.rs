use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tether_types::{
    Attachment, Message, MessagePart, Metadata, Role, StreamCheckpoint, StreamStatus, Thread,
};

/// MongoDB thread document. Dates are stored as BSON dates so range queries work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: String,
    pub session_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    pub role: Role,
    pub parts: Vec<MessagePart>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// One checkpoint per thread, keyed by thread id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStreamState {
    #[serde(rename = "_id")]
    pub thread_id: String,
    pub status: StreamStatus,
    pub chunks: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAttachment {
    #[serde(rename = "_id")]
    pub id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub key: String,
    pub url: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

// Conversions between engine models and MongoDB documents

impl From<Thread> for MongoThread {
    fn from(thread: Thread) -> Self {
        Self {
            id: thread.id,
            session_id: thread.session_id,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            metadata: thread.metadata,
        }
    }
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: thread.id,
            session_id: thread.session_id,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
            metadata: thread.metadata,
        }
    }
}

impl From<Message> for MongoMessage {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id,
            thread_id: msg.thread_id,
            role: msg.role,
            parts: msg.parts,
            created_at: msg.created_at,
            provider_id: msg.provider_id,
            model: msg.model,
            metadata: msg.metadata,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id,
            thread_id: msg.thread_id,
            role: msg.role,
            parts: msg.parts,
            created_at: msg.created_at,
            provider_id: msg.provider_id,
            model: msg.model,
            metadata: msg.metadata,
        }
    }
}

impl From<StreamCheckpoint> for MongoStreamState {
    fn from(checkpoint: StreamCheckpoint) -> Self {
        Self {
            thread_id: checkpoint.thread_id,
            status: checkpoint.status,
            chunks: checkpoint.chunks,
            updated_at: checkpoint.updated_at,
        }
    }
}

impl From<MongoStreamState> for StreamCheckpoint {
    fn from(state: MongoStreamState) -> Self {
        Self {
            thread_id: state.thread_id,
            status: state.status,
            chunks: state.chunks,
            updated_at: state.updated_at,
        }
    }
}

impl From<Attachment> for MongoAttachment {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id,
            thread_id: attachment.thread_id,
            message_id: attachment.message_id,
            name: attachment.name,
            mime_type: attachment.mime_type,
            size_bytes: i64::try_from(attachment.size_bytes).unwrap_or(i64::MAX),
            key: attachment.key,
            url: attachment.url,
            created_at: attachment.created_at,
        }
    }
}

impl From<MongoAttachment> for Attachment {
    fn from(attachment: MongoAttachment) -> Self {
        Self {
            id: attachment.id,
            thread_id: attachment.thread_id,
            message_id: attachment.message_id,
            name: attachment.name,
            mime_type: attachment.mime_type,
            size_bytes: u64::try_from(attachment.size_bytes).unwrap_or_default(),
            key: attachment.key,
            url: attachment.url,
            created_at: attachment.created_at,
        }
    }
}
