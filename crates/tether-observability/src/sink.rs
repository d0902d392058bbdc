use anyhow::Result;
use async_trait::async_trait;
use tether_types::TelemetryEvent;

/// Core trait for telemetry backends
///
/// Emission is fire-and-forget from the engine's side: a returned error is
/// logged by the caller and never fails the operation that produced the event.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn emit(&self, event: TelemetryEvent) -> Result<()>;
}
