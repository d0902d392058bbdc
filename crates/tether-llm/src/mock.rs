use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::streaming::ProviderEvent;
use crate::traits::{Provider, ProviderRequest, ProviderStream};

/// Provider that re-emits a fixed chunk list verbatim
#[derive(Debug, Clone)]
pub struct MockProvider {
    id: String,
    chunks: Vec<String>,
    delay: Option<Duration>,
    trailing_error: Option<String>,
    failure: Option<String>,
}

impl MockProvider {
    pub fn new<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: "mock".to_string(),
            chunks: chunks.into_iter().map(Into::into).collect(),
            delay: None,
            trailing_error: None,
            failure: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sleep before each chunk
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Emit an `error` event after the last chunk
    pub fn with_trailing_error(mut self, error: impl Into<String>) -> Self {
        self.trailing_error = Some(error.into());
        self
    }

    /// Break the stream itself (an `Err` item) after the last chunk
    pub fn with_failure(mut self, failure: impl Into<String>) -> Self {
        self.failure = Some(failure.into());
        self
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(["ok"])
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream> {
        tracing::debug!(
            thread_id = %request.thread_id,
            chunks = self.chunks.len(),
            "Starting mock generation"
        );

        let chunks = self.chunks.clone();
        let delay = self.delay;
        let trailing_error = self.trailing_error.clone();
        let failure = self.failure.clone();

        Ok(Box::pin(async_stream::stream! {
            for chunk in chunks {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(ProviderEvent::delta(chunk));
            }

            if let Some(error) = trailing_error {
                yield Ok(ProviderEvent::error(error));
            }

            if let Some(failure) = failure {
                yield Err(anyhow::anyhow!(failure));
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_mock_emits_chunks_in_order() {
        let provider = MockProvider::new(["a", "b"]).with_trailing_error("boom");
        let request = ProviderRequest::new("t1", vec![], "");

        let events: Vec<ProviderEvent> = provider
            .stream(request)
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                ProviderEvent::delta("a"),
                ProviderEvent::delta("b"),
                ProviderEvent::error("boom"),
            ]
        );
    }

    #[tokio::test]
    async fn test_mock_failure_is_err_item() {
        let provider = MockProvider::new(Vec::<String>::new()).with_failure("socket closed");
        let mut stream = provider.stream(ProviderRequest::new("t1", vec![], "")).await.unwrap();

        match stream.next().await {
            Some(Err(e)) => assert_eq!(e.to_string(), "socket closed"),
            other => panic!("Expected failure, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(stream.next().await.is_none());
    }
}
