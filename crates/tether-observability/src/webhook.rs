use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tether_types::TelemetryEvent;

use crate::sink::TelemetrySink;

/// Posts each event as JSON to an HTTP endpoint
pub struct WebhookSink {
    client: Client,
    url: String,
    token: Option<String>,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.into(),
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            tracing::debug!("Telemetry webhook accepted event: {}", status);
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());
        anyhow::bail!("Telemetry webhook error: {} - {}", status, body)
    }
}

#[async_trait]
impl TelemetrySink for WebhookSink {
    async fn emit(&self, event: TelemetryEvent) -> Result<()> {
        let mut request = self.client.post(&self.url).json(&event);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send telemetry event")?;

        self.handle_response(response).await
    }
}
