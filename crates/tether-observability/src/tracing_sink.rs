use anyhow::Result;
use async_trait::async_trait;
use tether_types::TelemetryEvent;

use crate::sink::TelemetrySink;

/// Writes each event as a structured `tracing` record
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl TelemetrySink for TracingSink {
    async fn emit(&self, event: TelemetryEvent) -> Result<()> {
        let payload = serde_json::to_string(&event.payload)?;
        tracing::info!(
            target: "tether::telemetry",
            event = %event.name,
            thread_id = event.thread_id.as_deref().unwrap_or(""),
            message_id = event.message_id.as_deref().unwrap_or(""),
            at = %event.at,
            payload = %payload,
            "telemetry"
        );
        Ok(())
    }
}
