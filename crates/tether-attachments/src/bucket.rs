use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tether_types::{Attachment, AttachmentUpload};
use tokio::sync::RwLock;

use crate::error::{AttachmentError, Result};
use crate::store::{key_segment, AttachmentStore};
use crate::validation::validate_attachment;

pub const DEFAULT_BUCKET_PREFIX: &str = "chat-attachments";

/// Minimal remote object-store surface
#[async_trait]
pub trait ObjectBucket: Send + Sync {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Object-store backed attachments with optional failover to a secondary store
pub struct BucketAttachmentStore {
    bucket: Arc<dyn ObjectBucket>,
    prefix: String,
    public_base_url: Option<String>,
    fallback: Option<Arc<dyn AttachmentStore>>,
    metadata: RwLock<HashMap<String, Attachment>>,
}

impl BucketAttachmentStore {
    pub fn new(bucket: Arc<dyn ObjectBucket>) -> Self {
        Self {
            bucket,
            prefix: DEFAULT_BUCKET_PREFIX.to_string(),
            public_base_url: None,
            fallback: None,
            metadata: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Store used when a bucket put fails
    pub fn with_fallback(mut self, fallback: Arc<dyn AttachmentStore>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn url_for(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("bucket://{}", key),
        }
    }
}

#[async_trait]
impl AttachmentStore for BucketAttachmentStore {
    async fn upload(&self, upload: AttachmentUpload) -> Result<Attachment> {
        validate_attachment(&upload.mime_type, upload.size_bytes())?;

        let id = AttachmentUpload::new_id();
        let key = format!(
            "{}/{}/{}/{}",
            self.prefix,
            key_segment(&upload.thread_id),
            id,
            key_segment(&upload.name)
        );

        if let Err(e) = self
            .bucket
            .put(&key, upload.data.clone(), &upload.mime_type)
            .await
        {
            return match &self.fallback {
                Some(fallback) => {
                    tracing::warn!(error = %e, key = %key, "Bucket upload failed, using fallback store");
                    fallback.upload(upload).await
                }
                None => Err(AttachmentError::Storage(format!("Bucket upload failed: {}", e))),
            };
        }

        let attachment = Attachment {
            id: id.clone(),
            thread_id: upload.thread_id,
            message_id: upload.message_id,
            name: upload.name,
            mime_type: upload.mime_type,
            size_bytes: upload.data.len() as u64,
            url: self.url_for(&key),
            key,
            created_at: Utc::now(),
        };

        self.metadata.write().await.insert(id, attachment.clone());
        Ok(attachment)
    }

    async fn get(&self, attachment_id: &str) -> Result<Option<Attachment>> {
        if let Some(attachment) = self.metadata.read().await.get(attachment_id) {
            return Ok(Some(attachment.clone()));
        }

        match &self.fallback {
            Some(fallback) => fallback.get(attachment_id).await,
            None => Ok(None),
        }
    }

    async fn delete(&self, attachment_id: &str) -> Result<()> {
        let stored = self.metadata.write().await.remove(attachment_id);
        if let Some(attachment) = stored {
            self.bucket.delete(&attachment.key).await?;
        }

        if let Some(fallback) = &self.fallback {
            fallback.delete(attachment_id).await?;
        }
        Ok(())
    }
}

/// Object bucket held in memory. Can be switched into a failing mode.
#[derive(Default)]
pub struct InMemoryBucket {
    objects: RwLock<HashMap<String, (Vec<u8>, String)>>,
    failing: AtomicBool,
}

impl InMemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent put fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl ObjectBucket for InMemoryBucket {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AttachmentError::Storage("bucket unavailable".to_string()));
        }
        self.objects
            .write()
            .await
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }
}
