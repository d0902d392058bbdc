use async_trait::async_trait;
use tether_types::{Attachment, AttachmentUpload};

use crate::error::Result;

/// Binary store for uploaded attachments
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Validate, store and describe an upload
    async fn upload(&self, upload: AttachmentUpload) -> Result<Attachment>;

    async fn get(&self, attachment_id: &str) -> Result<Option<Attachment>>;

    /// Remove the attachment. Unknown ids are a no-op.
    async fn delete(&self, attachment_id: &str) -> Result<()>;
}

/// Single path segment safe to embed in a storage key
pub(crate) fn key_segment(raw: &str) -> String {
    let segment: String = raw
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match segment.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => segment,
    }
}
