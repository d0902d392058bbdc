use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::client::OpenAICompatibleConfig;
use crate::history::to_provider_messages;
use crate::streaming::ProviderEvent;
use crate::traits::{Provider, ProviderRequest, ProviderStream};

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    error: Option<CompletionError>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionError {
    message: String,
}

/// Split text into word-sized chunks. Whitespace stays attached to the preceding word,
/// so concatenating the chunks gives back the input.
pub fn chunk_words(text: &str) -> Vec<String> {
    text.split_inclusive(char::is_whitespace)
        .map(str::to_string)
        .collect()
}

/// Provider that fetches the whole completion, then replays it word by word
pub struct CompletionProvider {
    id: String,
    config: OpenAICompatibleConfig,
    http_client: reqwest::Client,
}

impl CompletionProvider {
    pub fn new(id: impl Into<String>, config: OpenAICompatibleConfig) -> Result<Self> {
        let http_client = config.http_client()?;
        Ok(Self {
            id: id.into(),
            config,
            http_client,
        })
    }

    fn build_request(&self, request: &ProviderRequest) -> Value {
        serde_json::json!({
            "model": self.config.model_for(request),
            "stream": false,
            "messages": to_provider_messages(&request.messages),
        })
    }
}

#[async_trait]
impl Provider for CompletionProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream> {
        let payload = self.build_request(&request);

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

        let body: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse completion response")?;

        let events: Vec<ProviderEvent> = match body.error {
            Some(error) => vec![ProviderEvent::error(error.message)],
            None => {
                let text = body
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default();
                chunk_words(&text).into_iter().map(ProviderEvent::delta).collect()
            }
        };

        tracing::debug!(
            provider_id = %self.id,
            thread_id = %request.thread_id,
            chunks = events.len(),
            "Completion received"
        );

        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_words_concatenates_back() {
        let text = "Hello there,  world\nbye";
        let chunks = chunk_words(text);

        assert_eq!(chunks, vec!["Hello ", "there, ", " ", "world\n", "bye"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunk_words_empty() {
        assert!(chunk_words("").is_empty());
    }
}
