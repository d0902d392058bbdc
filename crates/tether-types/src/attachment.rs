use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored upload record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Opaque storage key inside the attachment store
    pub key: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Raw upload handed to an attachment store
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub thread_id: String,
    pub message_id: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl AttachmentUpload {
    pub fn new(
        thread_id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            message_id: None,
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Generate a fresh attachment id
    pub fn new_id() -> String {
        format!("att_{}", uuid::Uuid::new_v4().simple())
    }
}
