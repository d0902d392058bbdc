use serde::{Deserialize, Serialize};

/// Text used for the error frame of a cancelled generation
pub const CANCELLED: &str = "cancelled";

/// Core wire frame. Serialized as `{"type": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
    /// First frame of a `send` stream
    #[serde(rename_all = "camelCase")]
    Start { thread_id: String },

    /// First frame of a `resume` stream
    #[serde(rename_all = "camelCase")]
    Resume { thread_id: String, cursor: usize },

    Delta { text: String },

    Error { error: String },

    /// The generation completed
    Done,

    /// Replay ended but the generation has not completed; resume again later
    Active,
}

impl StreamFrame {
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::Error { error: error.into() }
    }

    /// Terminal for resume observers
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. } | Self::Active)
    }

    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize stream frame: {}", e);
                r#"{"type":"error","error":"serialization_failed"}"#.to_string()
            }
        }
    }
}

/// Encode a frame as a single event-stream record: `data: <json>\n\n`
pub fn encode_sse(frame: &StreamFrame) -> String {
    format!("data: {}\n\n", frame.to_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_bit_exact() {
        let cases = [
            (
                StreamFrame::Start { thread_id: "t1".to_string() },
                "data: {\"type\":\"start\",\"threadId\":\"t1\"}\n\n",
            ),
            (
                StreamFrame::Resume { thread_id: "t1".to_string(), cursor: 2 },
                "data: {\"type\":\"resume\",\"threadId\":\"t1\",\"cursor\":2}\n\n",
            ),
            (StreamFrame::delta("a"), "data: {\"type\":\"delta\",\"text\":\"a\"}\n\n"),
            (StreamFrame::error("boom"), "data: {\"type\":\"error\",\"error\":\"boom\"}\n\n"),
            (StreamFrame::Done, "data: {\"type\":\"done\"}\n\n"),
            (StreamFrame::Active, "data: {\"type\":\"active\"}\n\n"),
        ];

        for (frame, expected) in cases {
            assert_eq!(encode_sse(&frame), expected);
        }
    }

    #[test]
    fn test_frame_parses_back() {
        let frame: StreamFrame = serde_json::from_str(r#"{"type":"resume","threadId":"t9","cursor":0}"#).unwrap();
        assert_eq!(frame, StreamFrame::Resume { thread_id: "t9".to_string(), cursor: 0 });
        assert!(!frame.is_terminal());
        assert!(StreamFrame::Done.is_terminal());
    }
}
