use std::sync::Arc;

use tether_attachments::AttachmentStore;
use tether_llm::{Provider, ProviderRegistry};
use tether_observability::TelemetrySink;
use tether_persist::PersistenceClient;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::engine::{ChatEngine, EngineInner};
use crate::error::{EngineError, Result};
use crate::hub::StreamHub;

/// Builder for constructing a ChatEngine
pub struct ChatEngineBuilder {
    persistence: Option<Arc<dyn PersistenceClient>>,
    attachments: Option<Arc<dyn AttachmentStore>>,
    providers: ProviderRegistry,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl ChatEngineBuilder {
    pub fn new() -> Self {
        Self {
            persistence: None,
            attachments: None,
            providers: ProviderRegistry::new(),
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
            telemetry: None,
        }
    }

    pub fn persistence(mut self, client: Arc<dyn PersistenceClient>) -> Self {
        self.persistence = Some(client);
        self
    }

    pub fn attachments(mut self, store: Arc<dyn AttachmentStore>) -> Self {
        self.attachments = Some(store);
        self
    }

    /// Replace the provider registry
    pub fn providers(mut self, providers: ProviderRegistry) -> Self {
        self.providers = providers;
        self
    }

    /// Register one provider under its own id
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.register(provider);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Emit lifecycle events to a telemetry sink
    pub fn telemetry(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(sink);
        self
    }

    /// Build the ChatEngine
    pub fn build(self) -> Result<ChatEngine> {
        let persistence = self
            .persistence
            .ok_or_else(|| EngineError::Config("persistence client is required".to_string()))?;
        let attachments = self
            .attachments
            .ok_or_else(|| EngineError::Config("attachment store is required".to_string()))?;

        if !self.providers.contains(&self.config.default_provider_id) {
            return Err(EngineError::Config(format!(
                "default provider '{}' is not registered (available: {:?})",
                self.config.default_provider_id,
                self.providers.ids()
            )));
        }

        tracing::debug!(providers = ?self.providers.ids(), "Building chat engine");

        Ok(ChatEngine::from_inner(EngineInner {
            persistence,
            attachments,
            providers: self.providers,
            config: self.config,
            clock: self.clock,
            telemetry: self.telemetry,
            hub: StreamHub::new(),
        }))
    }
}

impl Default for ChatEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
