use std::collections::VecDeque;

use anyhow::Result;
use async_trait::async_trait;
use tether_types::TelemetryEvent;
use tokio::sync::Mutex;

use crate::sink::TelemetrySink;

/// In-memory collector with a bounded buffer. The oldest event is dropped once full.
#[derive(Debug)]
pub struct BufferedCollector {
    capacity: usize,
    events: Mutex<VecDeque<TelemetryEvent>>,
}

impl BufferedCollector {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Copy of the buffered events, oldest first
    pub async fn snapshot(&self) -> Vec<TelemetryEvent> {
        self.events.lock().await.iter().cloned().collect()
    }

    /// Take every buffered event, leaving the buffer empty
    pub async fn drain(&self) -> Vec<TelemetryEvent> {
        self.events.lock().await.drain(..).collect()
    }

    /// Buffered events with the given name
    pub async fn named(&self, name: &str) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .await
            .iter()
            .filter(|event| event.name == name)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BufferedCollector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl TelemetrySink for BufferedCollector {
    async fn emit(&self, event: TelemetryEvent) -> Result<()> {
        let mut events = self.events.lock().await;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }
}
