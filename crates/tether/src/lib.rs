//! # Tether
//!
//! Resumable chat streams. A generation runs once per thread and is fanned out to the
//! original caller and to any client that reconnects with a cursor, while a durable
//! checkpoint lets a finished stream be replayed later.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tether::prelude::*;
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = ChatEngine::builder()
//!         .persistence(Arc::new(InMemoryPersistenceClient::new()))
//!         .attachments(Arc::new(LocalAttachmentStore::new(".data/attachments")))
//!         .provider(Arc::new(MockProvider::new(["Hel", "lo"])))
//!         .build()?;
//!
//!     let message = Message::user_text("m1", "thread-1", "hi", chrono::Utc::now());
//!     let mut frames = engine.send(SendRequest::new("thread-1", "anonymous", message)).await?;
//!     while let Some(frame) = frames.next().await {
//!         print!("{}", encode_sse(&frame));
//!     }
//!
//!     // Later, from another connection
//!     let mut replay = engine.resume("thread-1", 1).await?;
//!     while let Some(frame) = replay.next().await {
//!         print!("{}", encode_sse(&frame));
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`tether-types`**: messages, threads, checkpoints, attachments, telemetry events
//! - **`tether-llm`**: provider trait, registry, mock and OpenAI-compatible providers
//! - **`tether-persist`**: persistence trait with in-memory and MongoDB backends
//! - **`tether-attachments`**: validation plus local and bucket attachment stores
//! - **`tether-observability`**: telemetry sinks
//! - **`tether-engine`**: send, resume, upload and retention orchestration

pub mod prelude;

pub use tether_types::{
    event_names, Attachment, AttachmentUpload, Message, MessagePart, Metadata, NewThread, Role,
    StreamCheckpoint, StreamStatus, TelemetryEvent, Thread,
};

pub use tether_llm::{
    MockProvider, OpenAICompatibleConfig, OpenAICompatibleProvider, Provider, ProviderConfig,
    ProviderEvent, ProviderFactory, ProviderRegistry, ProviderRequest, ProviderStream,
};

pub use tether_persist::{InMemoryPersistenceClient, PersistError, PersistenceClient};

#[cfg(feature = "mongodb")]
pub use tether_persist::MongoPersistenceClient;

pub use tether_attachments::{
    AttachmentError, AttachmentStore, BucketAttachmentStore, LocalAttachmentStore, ObjectBucket,
};

pub use tether_observability::{BufferedCollector, CompositeSink, TelemetrySink, TracingSink};

pub use tether_engine::{
    encode_sse, ChatEngine, ChatEngineBuilder, Clock, EngineConfig, EngineError, FrameStream,
    SendRequest, StreamFrame,
};
