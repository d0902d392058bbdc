use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tether_types::{Attachment, AttachmentUpload};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::{key_segment, AttachmentStore};
use crate::validation::validate_attachment;

/// URL prefix under which local attachments are served
pub const LOCAL_URL_PREFIX: &str = "/local-attachments";

/// Stores attachments on local disk under `{root}/{thread_id}/{id}/{name}`
pub struct LocalAttachmentStore {
    root: PathBuf,
    metadata: RwLock<HashMap<String, Attachment>>,
}

impl LocalAttachmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            metadata: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read back the stored bytes
    pub async fn read(&self, attachment_id: &str) -> Result<Option<Vec<u8>>> {
        let Some(attachment) = self.get(attachment_id).await? else {
            return Ok(None);
        };
        Ok(Some(tokio::fs::read(self.root.join(&attachment.key)).await?))
    }
}

#[async_trait]
impl AttachmentStore for LocalAttachmentStore {
    async fn upload(&self, upload: AttachmentUpload) -> Result<Attachment> {
        validate_attachment(&upload.mime_type, upload.size_bytes())?;

        let id = AttachmentUpload::new_id();
        let key = format!(
            "{}/{}/{}",
            key_segment(&upload.thread_id),
            id,
            key_segment(&upload.name)
        );
        let path = self.root.join(&key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &upload.data).await?;

        let attachment = Attachment {
            id: id.clone(),
            thread_id: upload.thread_id,
            message_id: upload.message_id,
            name: upload.name,
            mime_type: upload.mime_type,
            size_bytes: upload.data.len() as u64,
            url: format!("{}/{}", LOCAL_URL_PREFIX, key),
            key,
            created_at: Utc::now(),
        };

        tracing::debug!(attachment_id = %id, path = %path.display(), "Stored attachment on disk");

        self.metadata.write().await.insert(id, attachment.clone());
        Ok(attachment)
    }

    async fn get(&self, attachment_id: &str) -> Result<Option<Attachment>> {
        Ok(self.metadata.read().await.get(attachment_id).cloned())
    }

    async fn delete(&self, attachment_id: &str) -> Result<()> {
        let Some(attachment) = self.metadata.write().await.remove(attachment_id) else {
            return Ok(());
        };

        match tokio::fs::remove_file(self.root.join(&attachment.key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
