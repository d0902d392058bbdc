//! Prelude module for convenient imports
//!
//! Import everything you need with:
//! ```rust
//! use tether::prelude::*;
//! ```

pub use crate::{
    encode_sse, AttachmentStore, AttachmentUpload, ChatEngine, ChatEngineBuilder, EngineConfig,
    EngineError, FrameStream, InMemoryPersistenceClient, LocalAttachmentStore, Message,
    MessagePart, MockProvider, PersistenceClient, Provider, ProviderRegistry, Role, SendRequest,
    StreamFrame, StreamStatus, TelemetrySink,
};
