use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tether_types::TelemetryEvent;

use crate::sink::TelemetrySink;

/// Sink backed by a plain callback
pub struct FnSink<F> {
    callback: F,
}

impl<F> FnSink<F>
where
    F: Fn(TelemetryEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

#[async_trait]
impl<F> TelemetrySink for FnSink<F>
where
    F: Fn(TelemetryEvent) + Send + Sync,
{
    async fn emit(&self, event: TelemetryEvent) -> Result<()> {
        (self.callback)(event);
        Ok(())
    }
}

/// Forwards every event to each inner sink. A failing sink does not stop the others.
#[derive(Default, Clone)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl TelemetrySink for CompositeSink {
    async fn emit(&self, event: TelemetryEvent) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(event.clone()).await {
                tracing::warn!(event = %event.name, "Telemetry sink failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
