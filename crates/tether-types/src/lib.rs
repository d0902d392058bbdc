pub mod attachment;
pub mod checkpoint;
pub mod message;
pub mod telemetry;
pub mod thread;

pub use attachment::{Attachment, AttachmentUpload};
pub use checkpoint::{StreamCheckpoint, StreamStatus};
pub use message::{Message, MessagePart, Role, ToolState};
pub use telemetry::{event_names, TelemetryEvent};
pub use thread::{NewThread, Thread};

/// Free-form JSON metadata carried by threads, messages and telemetry payloads
pub type Metadata = serde_json::Map<String, serde_json::Value>;
