use chrono::{TimeZone, Utc};
use tether_types::{
    event_names, Message, MessagePart, Role, StreamCheckpoint, StreamStatus, TelemetryEvent, ToolState,
};

#[test]
fn test_message_serializes_camel_case() {
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let mut message = Message::user_text("m1", "t1", "hello", at);
    message.provider_id = Some("mock".to_string());

    let json = serde_json::to_value(&message).unwrap();
    assert_eq!(json["threadId"], "t1");
    assert_eq!(json["role"], "user");
    assert_eq!(json["providerId"], "mock");
    assert_eq!(json["parts"][0]["type"], "text");
    assert_eq!(json["parts"][0]["text"], "hello");
    assert!(json.get("model").is_none());
}

#[test]
fn test_message_deserializes_without_optional_fields() {
    let json = r#"{
        "id": "m1",
        "threadId": "t1",
        "role": "assistant",
        "parts": [{"type": "text", "text": "hi"}],
        "createdAt": "2025-01-02T03:04:05Z"
    }"#;
    let message: Message = serde_json::from_str(json).unwrap();

    assert_eq!(message.role, Role::Assistant);
    assert_eq!(message.text(), "hi");
    assert!(message.provider_id.is_none());
    assert!(message.metadata.is_none());
}

#[test]
fn test_tool_part_round_trip() {
    let part = MessagePart::Tool {
        tool_name: "search".to_string(),
        tool_call_id: "call_1".to_string(),
        state: ToolState::OutputAvailable,
        input: Some(serde_json::json!({"q": "rust"})),
        output: None,
    };

    let json = serde_json::to_string(&part).unwrap();
    assert!(json.contains("\"type\":\"tool\""));
    assert!(json.contains("\"toolName\":\"search\""));
    assert!(json.contains("\"state\":\"output-available\""));

    let back: MessagePart = serde_json::from_str(&json).unwrap();
    assert_eq!(back, part);
}

#[test]
fn test_checkpoint_status_serializes_lowercase() {
    let checkpoint = StreamCheckpoint::new("t1", StreamStatus::Aborted, vec!["a".to_string()], Utc::now());
    let json = serde_json::to_value(&checkpoint).unwrap();

    assert_eq!(json["status"], "aborted");
    assert_eq!(json["chunks"][0], "a");
    assert!(StreamStatus::Aborted.is_terminal());
    assert!(!StreamStatus::Active.is_terminal());
}

#[test]
fn test_telemetry_event_builder() {
    let event = TelemetryEvent::new(event_names::STREAM_COMPLETED, Utc::now())
        .thread("t1")
        .message("m1")
        .field("chunks", 3)
        .field("providerId", "mock");

    assert_eq!(event.name, "stream.completed");
    assert_eq!(event.thread_id.as_deref(), Some("t1"));
    assert_eq!(event.payload["chunks"], 3);
    assert_eq!(event.payload["providerId"], "mock");
}
