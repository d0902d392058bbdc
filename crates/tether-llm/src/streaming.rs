use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use anyhow::Result;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

/// Event produced by a provider while generating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderEvent {
    Delta { text: String },
    Error { error: String },
}

impl ProviderEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error { error: error.into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.as_ref())
            .and_then(|d| d.content.as_deref())
    }

    fn to_provider_events(&self) -> Vec<ProviderEvent> {
        if let Some(error) = &self.error {
            return vec![ProviderEvent::error(error.message.clone())];
        }

        match self.content() {
            Some(content) if !content.is_empty() => vec![ProviderEvent::delta(content)],
            _ => Vec::new(),
        }
    }
}

/// Line buffer for SSE parsing. Holds bytes until a full `\n`-terminated line arrives,
/// so multi-byte characters split across network chunks decode correctly.
pub struct LineBuffer {
    buffer: VecDeque<u8>,
}

impl LineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line, trimmed. `None` if no newline is buffered yet.
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match std::str::from_utf8(&line_bytes) {
            Ok(line) => Some(Ok(line.trim().to_string())),
            Err(e) => Some(Err(anyhow::anyhow!("Invalid UTF-8: {}", e))),
        }
    }

    /// Whatever is left after the last newline
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let bytes: Vec<u8> = self.buffer.drain(..).collect();
        let line = String::from_utf8_lossy(&bytes).trim().to_string();
        (!line.is_empty()).then_some(line)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

enum Line {
    Events(Vec<ProviderEvent>),
    Done,
    Skip,
}

fn parse_line(line: &str) -> Line {
    let Some(data) = line.strip_prefix("data:") else {
        return Line::Skip;
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Line::Done;
    }

    match serde_json::from_str::<ChatStreamChunk>(data) {
        Ok(chunk) => Line::Events(chunk.to_provider_events()),
        Err(e) => {
            tracing::debug!("Skipping unparseable stream line: {}", e);
            Line::Skip
        }
    }
}

/// Parse an OpenAI-style chat completions SSE body into provider events.
///
/// Lines without a `data:` prefix and payloads that fail to parse are skipped.
/// `data: [DONE]` ends the stream.
pub fn parse_chat_sse_stream<S, B, E>(
    bytes: S,
) -> Pin<Box<dyn Stream<Item = Result<ProviderEvent>> + Send>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(bytes);
        let mut buffer = LineBuffer::with_capacity(4096);
        let mut done = false;

        while !done {
            let Some(chunk_result) = byte_chunks.next().await else {
                break;
            };

            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref());

                    while let Some(line_result) = buffer.next_line() {
                        let line = match line_result {
                            Ok(line) => line,
                            Err(e) => {
                                tracing::debug!("{}", e);
                                continue;
                            }
                        };

                        match parse_line(&line) {
                            Line::Events(events) => {
                                for event in events {
                                    yield Ok(event);
                                }
                            }
                            Line::Done => {
                                done = true;
                                break;
                            }
                            Line::Skip => {}
                        }
                    }
                }
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    done = true;
                }
            }
        }

        if !done {
            if let Some(line) = buffer.take_remainder() {
                if let Line::Events(events) = parse_line(&line) {
                    for event in events {
                        yield Ok(event);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: &[&str]) -> impl Stream<Item = std::result::Result<Vec<u8>, std::io::Error>> + Send + 'static {
        let owned: Vec<_> = chunks
            .iter()
            .map(|c| Ok::<_, std::io::Error>(c.as_bytes().to_vec()))
            .collect();
        futures::stream::iter(owned)
    }

    async fn collect(chunks: &[&str]) -> Vec<ProviderEvent> {
        parse_chat_sse_stream(body(chunks))
            .map(|e| e.unwrap())
            .collect()
            .await
    }

    #[test]
    fn test_line_buffer_basic() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"line1\nline2\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_line_buffer_partial_line() {
        let mut buffer = LineBuffer::with_capacity(64);
        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[tokio::test]
    async fn test_parses_deltas_until_done() {
        let events = collect(&[
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ])
        .await;

        assert_eq!(events, vec![ProviderEvent::delta("Hel"), ProviderEvent::delta("lo")]);
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let events = collect(&[
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"ok\"}}]}\n",
            ": keep-alive\n",
            "data: not json\n",
        ])
        .await;

        assert_eq!(events, vec![ProviderEvent::delta("ok")]);
    }

    #[tokio::test]
    async fn test_error_payload_becomes_error_event() {
        let events = collect(&["data: {\"error\":{\"message\":\"rate limited\"}}\n"]).await;
        assert_eq!(events, vec![ProviderEvent::error("rate limited")]);
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let events = collect(&["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"]).await;
        assert_eq!(events, vec![ProviderEvent::delta("tail")]);
    }
}
