use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::to_provider_messages;
use crate::streaming::parse_chat_sse_stream;
use crate::traits::{Provider, ProviderRequest, ProviderStream};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Connection settings shared by every OpenAI-compatible backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAICompatibleConfig {
    pub api_key: String,
    /// Model used when the request does not name one
    pub model: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl OpenAICompatibleConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            timeout_ms: None,
        }
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .context("Invalid API key format")?,
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout_ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        builder.build().context("Failed to create HTTP client")
    }

    pub(crate) fn model_for<'a>(&'a self, request: &'a ProviderRequest) -> &'a str {
        if request.model.is_empty() {
            &self.model
        } else {
            &request.model
        }
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Streaming chat-completions provider (HTTP direct, no SDK)
pub struct OpenAICompatibleProvider {
    id: String,
    config: OpenAICompatibleConfig,
    http_client: reqwest::Client,
}

impl OpenAICompatibleProvider {
    pub fn new(id: impl Into<String>, config: OpenAICompatibleConfig) -> Result<Self> {
        let http_client = config.http_client()?;
        Ok(Self {
            id: id.into(),
            config,
            http_client,
        })
    }

    /// `openai` provider against the public OpenAI API
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new("openai", OpenAICompatibleConfig::new(api_key, model, OPENAI_API_BASE))
    }

    /// `openrouter` provider: same wire format, different base URL
    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::new("openrouter", OpenAICompatibleConfig::new(api_key, model, OPENROUTER_API_BASE))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn config(&self) -> &OpenAICompatibleConfig {
        &self.config
    }

    fn build_request(&self, request: &ProviderRequest) -> Value {
        serde_json::json!({
            "model": self.config.model_for(request),
            "stream": true,
            "messages": to_provider_messages(&request.messages),
        })
    }
}

#[async_trait]
impl Provider for OpenAICompatibleProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream> {
        let payload = self.build_request(&request);

        tracing::debug!(
            provider_id = %self.id,
            thread_id = %request.thread_id,
            model = %self.config.model_for(&request),
            "Requesting streaming completion"
        );

        let response = self
            .http_client
            .post(self.config.completions_url())
            .json(&payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Provider request failed ({}): {}", status, error_text);
        }

        let events = parse_chat_sse_stream(response.bytes_stream());

        let stream: ProviderStream = match request.cancel {
            Some(cancel) => Box::pin(events.take_until(cancel.cancelled_owned())),
            None => events,
        };
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_model_overrides_config() {
        let provider = OpenAICompatibleProvider::openai("sk-test", "gpt-4o-mini").unwrap();

        let defaulted = provider.build_request(&ProviderRequest::new("t1", vec![], ""));
        assert_eq!(defaulted["model"], "gpt-4o-mini");
        assert_eq!(defaulted["stream"], true);

        let explicit = provider.build_request(&ProviderRequest::new("t1", vec![], "gpt-4.1"));
        assert_eq!(explicit["model"], "gpt-4.1");
    }

    #[test]
    fn test_openrouter_base_url() {
        let provider = OpenAICompatibleProvider::openrouter("sk-test", "meta/llama").unwrap();
        assert_eq!(provider.id(), "openrouter");
        assert_eq!(
            provider.config().completions_url(),
            "https://openrouter.ai/api/v1/chat/completions"
        );
    }
}
