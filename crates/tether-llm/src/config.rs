// Factory config for building providers from settings files

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::mock::MockProvider;
use crate::openai::{
    CompletionProvider, OpenAICompatibleConfig, OpenAICompatibleProvider, OPENAI_API_BASE,
    OPENROUTER_API_BASE,
};
use crate::registry::ProviderRegistry;
use crate::traits::Provider;

fn default_mock_chunks() -> Vec<String> {
    vec!["ok".to_string()]
}

/// Connection details for a remote backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub api_key: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl RemoteConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            timeout_ms: None,
        }
    }

    fn resolve(self, default_base: &str) -> OpenAICompatibleConfig {
        OpenAICompatibleConfig {
            api_key: self.api_key,
            model: self.model,
            base_url: self.base_url.unwrap_or_else(|| default_base.to_string()),
            timeout_ms: self.timeout_ms,
        }
    }
}

/// Provider configuration, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Mock {
        #[serde(default = "default_mock_chunks")]
        chunks: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    OpenAI(RemoteConfig),
    OpenRouter(RemoteConfig),
    /// Non-streaming backend replayed as word chunks
    Completion {
        id: String,
        #[serde(flatten)]
        remote: RemoteConfig,
    },
}

impl ProviderConfig {
    pub fn mock<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Mock {
            chunks: chunks.into_iter().map(Into::into).collect(),
            delay_ms: None,
        }
    }

    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::OpenAI(RemoteConfig::new(api_key, model))
    }

    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::OpenRouter(RemoteConfig::new(api_key, model))
    }

    /// Id the built provider registers under
    pub fn provider_id(&self) -> &str {
        match self {
            Self::Mock { .. } => "mock",
            Self::OpenAI(_) => "openai",
            Self::OpenRouter(_) => "openrouter",
            Self::Completion { id, .. } => id.as_str(),
        }
    }
}

/// Factory for creating providers from configuration
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: ProviderConfig) -> Result<Arc<dyn Provider>> {
        match config {
            ProviderConfig::Mock { chunks, delay_ms } => {
                let mut provider = MockProvider::new(chunks);
                if let Some(ms) = delay_ms {
                    provider = provider.with_delay(Duration::from_millis(ms));
                }
                Ok(Arc::new(provider))
            }
            ProviderConfig::OpenAI(remote) => Ok(Arc::new(OpenAICompatibleProvider::new(
                "openai",
                remote.resolve(OPENAI_API_BASE),
            )?)),
            ProviderConfig::OpenRouter(remote) => Ok(Arc::new(OpenAICompatibleProvider::new(
                "openrouter",
                remote.resolve(OPENROUTER_API_BASE),
            )?)),
            ProviderConfig::Completion { id, remote } => Ok(Arc::new(CompletionProvider::new(
                id,
                remote.resolve(OPENAI_API_BASE),
            )?)),
        }
    }

    /// Build a registry holding one provider per config entry
    pub fn registry(configs: impl IntoIterator<Item = ProviderConfig>) -> Result<ProviderRegistry> {
        let mut registry = ProviderRegistry::new();
        for config in configs {
            registry.register(Self::create(config)?);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_config_parses() {
        let json = r#"[
            {"type": "mock", "chunks": ["a", "b"]},
            {"type": "openrouter", "api_key": "k", "model": "m"},
            {"type": "completion", "id": "local", "api_key": "k", "model": "m", "base_url": "http://localhost:1234/v1"}
        ]"#;
        let configs: Vec<ProviderConfig> = serde_json::from_str(json).unwrap();

        let ids: Vec<&str> = configs.iter().map(ProviderConfig::provider_id).collect();
        assert_eq!(ids, vec!["mock", "openrouter", "local"]);

        match &configs[0] {
            ProviderConfig::Mock { chunks, delay_ms } => {
                assert_eq!(chunks, &vec!["a".to_string(), "b".to_string()]);
                assert!(delay_ms.is_none());
            }
            _ => panic!("Expected Mock config"),
        }
    }

    #[test]
    fn test_factory_registers_by_id() {
        let registry = ProviderFactory::registry(vec![
            ProviderConfig::mock(["ok"]),
            ProviderConfig::openai("sk-test", "gpt-4o-mini"),
        ])
        .unwrap();

        assert_eq!(registry.ids(), vec!["mock", "openai"]);
    }
}
