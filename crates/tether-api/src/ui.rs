//! Re-encoding of engine frames for chat UI clients

use serde::Serialize;
use tether_engine::StreamFrame;

/// UI-facing event. Serialized as `{"type": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiEvent<'a> {
    TextStart { id: &'a str },
    TextDelta { id: &'a str, delta: &'a str },
    TextEnd { id: &'a str },
    DataError { message: &'a str },
    DataActive { id: &'a str },
}

impl<'a> UiEvent<'a> {
    /// Map a frame onto the UI vocabulary. `text_id` names the assistant text block.
    pub fn from_frame(text_id: &'a str, frame: &'a StreamFrame) -> Self {
        match frame {
            StreamFrame::Start { .. } | StreamFrame::Resume { .. } => Self::TextStart { id: text_id },
            StreamFrame::Delta { text } => Self::TextDelta { id: text_id, delta: text },
            StreamFrame::Done => Self::TextEnd { id: text_id },
            StreamFrame::Error { error } => Self::DataError { message: error },
            StreamFrame::Active => Self::DataActive { id: text_id },
        }
    }

    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize UI event: {}", e);
                r#"{"type":"data-error","message":"serialization_failed"}"#.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_map_to_ui_events() {
        let cases = [
            (
                StreamFrame::Start { thread_id: "t1".to_string() },
                r#"{"type":"text-start","id":"t1"}"#,
            ),
            (
                StreamFrame::Resume { thread_id: "t1".to_string(), cursor: 3 },
                r#"{"type":"text-start","id":"t1"}"#,
            ),
            (StreamFrame::delta("Hi"), r#"{"type":"text-delta","id":"t1","delta":"Hi"}"#),
            (StreamFrame::Done, r#"{"type":"text-end","id":"t1"}"#),
            (StreamFrame::error("boom"), r#"{"type":"data-error","message":"boom"}"#),
            (StreamFrame::Active, r#"{"type":"data-active","id":"t1"}"#),
        ];

        for (frame, expected) in cases {
            assert_eq!(UiEvent::from_frame("t1", &frame).to_json(), expected);
        }
    }
}
