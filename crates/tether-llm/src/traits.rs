use crate::streaming::ProviderEvent;
use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use tether_types::{Message, Metadata};
use tokio_util::sync::CancellationToken;

/// Lazy, finite sequence of generation events. Ends when the generation ends.
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<ProviderEvent>> + Send>>;

/// Trait for text-generation backends
///
/// Implementations turn the ordered history of a thread into a stream of
/// `delta`/`error` events. An `Err` item means the stream itself broke.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry id (e.g. "openai", "mock")
    fn id(&self) -> &str;

    /// Whether attachment parts are forwarded to the backend
    fn supports_attachments(&self) -> bool {
        true
    }

    /// Start a generation for the given request
    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream>;
}

#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub model: String,
    pub metadata: Option<Metadata>,
    pub cancel: Option<CancellationToken>,
}

impl ProviderRequest {
    pub fn new(thread_id: impl Into<String>, messages: Vec<Message>, model: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            messages,
            model: model.into(),
            metadata: None,
            cancel: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Option<Metadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_cancel(mut self, cancel: Option<CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }
}
