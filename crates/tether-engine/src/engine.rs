use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{FutureExt, Stream, StreamExt};
use tether_attachments::{validate_attachment, AttachmentStore};
use tether_llm::{Provider, ProviderEvent, ProviderRegistry, ProviderRequest};
use tether_observability::TelemetrySink;
use tether_persist::PersistenceClient;
use tether_types::{
    event_names, Attachment, AttachmentUpload, Message, MessagePart, NewThread, Role,
    StreamCheckpoint, StreamStatus, TelemetryEvent,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::builder::ChatEngineBuilder;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::frames::{StreamFrame, CANCELLED};
use crate::hub::{HubEvent, LiveBroadcast, StreamHub, Subscription};

/// Frames delivered to one reader of a generation
pub type FrameStream = Pin<Box<dyn Stream<Item = StreamFrame> + Send>>;

/// Input for [`ChatEngine::send`]
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub thread_id: String,
    pub session_id: String,
    /// User message, already holding its parts. Its `thread_id` must match.
    pub message: Message,
    pub model: Option<String>,
    pub provider_id: Option<String>,
    pub cancel: Option<CancellationToken>,
}

impl SendRequest {
    pub fn new(thread_id: impl Into<String>, session_id: impl Into<String>, message: Message) -> Self {
        Self {
            thread_id: thread_id.into(),
            session_id: session_id.into(),
            message,
            model: None,
            provider_id: None,
            cancel: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

pub(crate) struct EngineInner {
    pub(crate) persistence: Arc<dyn PersistenceClient>,
    pub(crate) attachments: Arc<dyn AttachmentStore>,
    pub(crate) providers: ProviderRegistry,
    pub(crate) config: EngineConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) telemetry: Option<Arc<dyn TelemetrySink>>,
    pub(crate) hub: StreamHub,
}

impl EngineInner {
    async fn emit(&self, event: TelemetryEvent) {
        let Some(sink) = &self.telemetry else {
            return;
        };
        let name = event.name.clone();
        if let Err(e) = sink.emit(event).await {
            tracing::warn!(event = %name, "Failed to emit telemetry: {}", e);
        }
    }
}

/// Resumable stream orchestration engine. Cheap to clone.
#[derive(Clone)]
pub struct ChatEngine {
    inner: Arc<EngineInner>,
}

impl ChatEngine {
    pub(crate) fn from_inner(inner: EngineInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Create a builder for fluent construction
    pub fn builder() -> ChatEngineBuilder {
        ChatEngineBuilder::new()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn persistence(&self) -> &Arc<dyn PersistenceClient> {
        &self.inner.persistence
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.inner.providers
    }

    /// Whether a generation is currently in flight for the thread
    pub async fn is_streaming(&self, thread_id: &str) -> bool {
        self.inner.hub.is_live(thread_id).await
    }

    pub async fn live_streams(&self) -> usize {
        self.inner.hub.live_count().await
    }

    fn resolve_provider(&self, provider_id: Option<&str>) -> Result<Arc<dyn Provider>> {
        let id = provider_id.unwrap_or(&self.inner.config.default_provider_id);
        self.inner
            .providers
            .get(id)
            .ok_or_else(|| EngineError::UnknownProvider(id.to_string()))
    }

    /// Save the user message and start a generation for the thread.
    ///
    /// The returned stream starts with `start`, carries every `delta` and `error`, and ends
    /// with `done` when the generation completed. Dropping it does not stop the generation.
    pub async fn send(&self, request: SendRequest) -> Result<FrameStream> {
        if request.thread_id.is_empty() {
            return Err(EngineError::InvalidRequest("thread id is required".to_string()));
        }
        if request.message.thread_id != request.thread_id {
            return Err(EngineError::InvalidRequest(format!(
                "message belongs to thread {}, not {}",
                request.message.thread_id, request.thread_id
            )));
        }

        let provider = self.resolve_provider(request.provider_id.as_deref())?;
        let broadcast = self.inner.hub.register(&request.thread_id).await?;

        match self.prepare(&request, &provider).await {
            Ok(history) => Ok(self.start_generation(request, provider, broadcast, history)),
            Err(e) => {
                tracing::error!(thread_id = %request.thread_id, "Failed to start generation: {}", e);
                broadcast.fail(e.to_string()).await;
                broadcast.finish(StreamStatus::Aborted).await;
                self.inner.hub.release(&broadcast).await;
                Err(e)
            }
        }
    }

    /// Persist everything that must exist before the drain starts. Returns the history.
    async fn prepare(&self, request: &SendRequest, provider: &Arc<dyn Provider>) -> Result<Vec<Message>> {
        let inner = &self.inner;
        let thread_id = &request.thread_id;

        inner
            .persistence
            .create_thread(NewThread {
                id: thread_id.clone(),
                session_id: request.session_id.clone(),
                metadata: request.message.metadata.clone(),
                created_at: inner.clock.now(),
            })
            .await?;

        inner.persistence.save_message(request.message.clone()).await?;
        inner
            .emit(
                TelemetryEvent::new(event_names::MESSAGE_SAVED, inner.clock.now())
                    .thread(thread_id.as_str())
                    .message(request.message.id.as_str())
                    .field("role", request.message.role.as_str()),
            )
            .await;

        let history = inner.persistence.list_messages(thread_id).await?;

        inner
            .persistence
            .upsert_stream_state(StreamCheckpoint::new(
                thread_id.as_str(),
                StreamStatus::Active,
                Vec::new(),
                inner.clock.now(),
            ))
            .await?;

        tracing::info!(
            thread_id = %thread_id,
            provider_id = %provider.id(),
            messages = history.len(),
            "Starting generation"
        );

        Ok(history)
    }

    fn start_generation(
        &self,
        request: SendRequest,
        provider: Arc<dyn Provider>,
        broadcast: Arc<LiveBroadcast>,
        history: Vec<Message>,
    ) -> FrameStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(StreamFrame::Start {
            thread_id: request.thread_id.clone(),
        });

        let cancel = request.cancel.clone().unwrap_or_default();
        let provider_request = ProviderRequest::new(
            request.thread_id.as_str(),
            history,
            request.model.clone().unwrap_or_default(),
        )
        .with_metadata(request.message.metadata.clone())
        .with_cancel(Some(cancel.clone()));

        let generation = Generation {
            inner: Arc::clone(&self.inner),
            thread_id: request.thread_id,
            model: request.model,
            provider,
            provider_request,
            broadcast,
            cancel,
            tx,
            ended_on_error: AtomicBool::new(false),
        };
        tokio::spawn(generation.run());

        Box::pin(UnboundedReceiverStream::new(rx))
    }

    /// Reattach to a thread's generation from `cursor` onward.
    ///
    /// Served from the live broadcast while the generation runs, otherwise from the
    /// durable checkpoint. Fails with [`EngineError::NoActiveStream`] if neither exists.
    pub async fn resume(&self, thread_id: &str, cursor: usize) -> Result<FrameStream> {
        if let Some(broadcast) = self.inner.hub.get(thread_id).await {
            let subscription = broadcast.subscribe(cursor).await;
            tracing::debug!(
                thread_id,
                cursor,
                replay = subscription.replay.len(),
                "Resuming from live broadcast"
            );
            return Ok(live_resume(thread_id.to_string(), cursor, subscription));
        }

        let checkpoint = self
            .inner
            .persistence
            .get_stream_state(thread_id)
            .await?
            .ok_or_else(|| EngineError::NoActiveStream(thread_id.to_string()))?;

        tracing::debug!(
            thread_id,
            cursor,
            status = checkpoint.status.as_str(),
            "Resuming from checkpoint"
        );

        let mut frames = Vec::with_capacity(checkpoint.chunks.len() + 2);
        frames.push(StreamFrame::Resume {
            thread_id: thread_id.to_string(),
            cursor,
        });
        frames.extend(checkpoint.chunks_from(cursor).iter().cloned().map(StreamFrame::delta));
        frames.push(match checkpoint.status {
            StreamStatus::Completed => StreamFrame::Done,
            _ => StreamFrame::Active,
        });

        Ok(Box::pin(futures::stream::iter(frames)))
    }

    /// Validate, store and record an attachment
    pub async fn upload_attachment(&self, upload: AttachmentUpload) -> Result<Attachment> {
        validate_attachment(&upload.mime_type, upload.size_bytes())?;

        let thread_id = upload.thread_id.clone();
        let attachment = self.inner.attachments.upload(upload).await?;
        self.inner.persistence.save_attachment(attachment.clone()).await?;

        self.inner
            .emit(
                TelemetryEvent::new(event_names::ATTACHMENT_UPLOADED, self.inner.clock.now())
                    .thread(thread_id)
                    .field("attachmentId", attachment.id.as_str())
                    .field("mimeType", attachment.mime_type.as_str())
                    .field("sizeBytes", attachment.size_bytes),
            )
            .await;

        tracing::info!(attachment_id = %attachment.id, size_bytes = attachment.size_bytes, "Attachment uploaded");
        Ok(attachment)
    }

    /// Delete threads idle for longer than the retention window. Returns how many.
    pub async fn run_retention(&self) -> Result<usize> {
        let cutoff =
            self.inner.clock.now() - chrono::Duration::days(i64::from(self.inner.config.retention_days));
        let deleted = self.inner.persistence.prune_expired(cutoff).await?;

        tracing::info!(deleted, %cutoff, "Retention run finished");
        Ok(deleted)
    }
}

fn live_resume(thread_id: String, cursor: usize, subscription: Subscription) -> FrameStream {
    let Subscription {
        replay,
        status,
        last_error,
        receiver,
    } = subscription;

    Box::pin(async_stream::stream! {
        yield StreamFrame::Resume { thread_id, cursor };

        for chunk in replay {
            yield StreamFrame::Delta { text: chunk };
        }

        let Some(mut receiver) = receiver else {
            yield terminal_frame(status, last_error);
            return;
        };

        loop {
            match receiver.recv().await {
                Some(HubEvent::Delta(text)) => yield StreamFrame::Delta { text },
                Some(HubEvent::Error(error)) => {
                    yield StreamFrame::Error { error };
                    break;
                }
                Some(HubEvent::Finished(status)) => {
                    yield terminal_frame(status, None);
                    break;
                }
                None => {
                    // Source went away without a terminal event.
                    yield StreamFrame::Active;
                    break;
                }
            }
        }
    })
}

fn terminal_frame(status: StreamStatus, last_error: Option<String>) -> StreamFrame {
    match status {
        StreamStatus::Completed => StreamFrame::Done,
        StreamStatus::Aborted => StreamFrame::Error {
            error: last_error.unwrap_or_else(|| "aborted".to_string()),
        },
        StreamStatus::Active => StreamFrame::Active,
    }
}

/// One provider drain, owned by its own task
struct Generation {
    inner: Arc<EngineInner>,
    thread_id: String,
    model: Option<String>,
    provider: Arc<dyn Provider>,
    provider_request: ProviderRequest,
    broadcast: Arc<LiveBroadcast>,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<StreamFrame>,
    /// Whether the last frame sent to the caller was an error
    ended_on_error: AtomicBool,
}

impl Generation {
    async fn run(self) {
        // A panicking provider still has to release the thread.
        let outcome = match AssertUnwindSafe(self.drain()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(format!("Provider panicked: {}", panic_message(panic.as_ref()))),
        };
        self.finish(outcome).await;
    }

    /// Drain the provider. `Err` carries the message of a failure or cancellation.
    async fn drain(&self) -> std::result::Result<(), String> {
        let mut events = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(CANCELLED.to_string()),
            stream = self.provider.stream(self.provider_request.clone()) => {
                stream.map_err(|e| e.to_string())?
            }
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(CANCELLED.to_string()),
                next = events.next() => next,
            };

            match next {
                None => return Ok(()),
                Some(Err(e)) => return Err(e.to_string()),
                Some(Ok(ProviderEvent::Delta { text })) => {
                    if text.is_empty() {
                        continue;
                    }
                    self.record_delta(text).await.map_err(|e| e.to_string())?;
                }
                Some(Ok(ProviderEvent::Error { error })) => {
                    tracing::warn!(thread_id = %self.thread_id, "Provider reported error: {}", error);
                    self.broadcast.fail(error.clone()).await;
                    self.forward(StreamFrame::Error { error });
                }
            }
        }
    }

    /// Buffer, checkpoint, then deliver to the caller and observers
    async fn record_delta(&self, text: String) -> Result<()> {
        let chunks = self.broadcast.append(text.clone()).await;
        let saved = self
            .inner
            .persistence
            .upsert_stream_state(StreamCheckpoint::new(
                self.thread_id.as_str(),
                StreamStatus::Active,
                chunks,
                self.inner.clock.now(),
            ))
            .await;

        if let Err(e) = saved {
            self.broadcast.discard_unpublished().await;
            return Err(e.into());
        }

        self.forward(StreamFrame::Delta { text });
        self.broadcast.publish().await;
        Ok(())
    }

    /// Send to the original caller. A caller that went away is ignored.
    fn forward(&self, frame: StreamFrame) {
        self.ended_on_error
            .store(matches!(frame, StreamFrame::Error { .. }), Ordering::Relaxed);
        let _ = self.tx.send(frame);
    }

    async fn finish(self, outcome: std::result::Result<(), String>) {
        let inner = &self.inner;

        if let Err(error) = &outcome {
            tracing::error!(thread_id = %self.thread_id, "Generation failed: {}", error);
            self.broadcast.discard_unpublished().await;
            self.broadcast.fail(error.clone()).await;
            self.forward(StreamFrame::Error { error: error.clone() });
        }

        let (chunks, mut status) = self.broadcast.snapshot().await;
        if status == StreamStatus::Active {
            status = StreamStatus::Completed;
        }

        let assistant_id = format!("{}-assistant-{}", self.thread_id, uuid::Uuid::new_v4().simple());
        let mut assistant = Message::new(
            assistant_id.as_str(),
            self.thread_id.as_str(),
            Role::Assistant,
            vec![MessagePart::text(chunks.concat())],
            inner.clock.now(),
        );
        assistant.provider_id = Some(self.provider.id().to_string());
        assistant.model = self.model.clone();

        if let Err(e) = inner.persistence.save_message(assistant).await {
            tracing::error!(thread_id = %self.thread_id, "Failed to persist assistant message: {}", e);
            if status == StreamStatus::Completed {
                status = StreamStatus::Aborted;
                let error = format!("Failed to persist assistant message: {}", e);
                self.broadcast.fail(error.clone()).await;
                self.forward(StreamFrame::Error { error });
            }
        }

        let chunk_count = chunks.len();
        if let Err(e) = inner
            .persistence
            .upsert_stream_state(StreamCheckpoint::new(
                self.thread_id.as_str(),
                status,
                chunks,
                inner.clock.now(),
            ))
            .await
        {
            tracing::error!(thread_id = %self.thread_id, "Failed to finalize checkpoint: {}", e);
        }

        inner
            .emit(
                TelemetryEvent::new(event_names::STREAM_COMPLETED, inner.clock.now())
                    .thread(self.thread_id.as_str())
                    .message(assistant_id.as_str())
                    .field("chunks", chunk_count)
                    .field("providerId", self.provider.id())
                    .field("status", status.as_str()),
            )
            .await;

        self.broadcast.finish(status).await;
        inner.hub.release(&self.broadcast).await;

        if status == StreamStatus::Completed {
            self.forward(StreamFrame::Done);
        } else if !self.ended_on_error.load(Ordering::Relaxed) {
            // Deltas arrived after an error event; close on the error again.
            let error = self
                .broadcast
                .last_error()
                .await
                .unwrap_or_else(|| "aborted".to_string());
            self.forward(StreamFrame::Error { error });
        }

        tracing::info!(
            thread_id = %self.thread_id,
            provider_id = %self.provider.id(),
            chunks = chunk_count,
            status = status.as_str(),
            "Generation finished"
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
