pub mod callback;
pub mod collector;
pub mod sink;
pub mod tracing_sink;
pub mod webhook;

pub use callback::{CompositeSink, FnSink};
pub use collector::BufferedCollector;
pub use sink::TelemetrySink;
pub use tracing_sink::TracingSink;
pub use webhook::WebhookSink;
