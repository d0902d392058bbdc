use serde::{Deserialize, Serialize};
use tether_types::{Message, MessagePart};

/// Flattened `{role, content}` pair sent to chat-completion backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

/// Prompt rendering of a single part. Non-text parts become bracketed placeholders.
pub fn part_to_prompt_text(part: &MessagePart) -> String {
    match part {
        MessagePart::Text { text } | MessagePart::Reasoning { text } => text.clone(),
        MessagePart::Attachment { name, .. } => match name {
            Some(name) => format!("[attachment:{}]", name),
            None => "[attachment]".to_string(),
        },
        MessagePart::File { name, media_type, .. } => {
            format!("[file:{}]", name.as_deref().unwrap_or(media_type))
        }
        MessagePart::SourceUrl { url, title } => {
            format!("[source:{}]", title.as_deref().unwrap_or(url))
        }
        MessagePart::SourceDocument { title, .. } => format!("[source-document:{}]", title),
        MessagePart::Tool { tool_name, state, .. } => {
            format!("[tool:{}:{}]", tool_name, state.as_str())
        }
        MessagePart::Data { name, .. } => format!("[data:{}]", name),
    }
}

fn to_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| {
            let parts: Vec<String> = message.parts.iter().map(part_to_prompt_text).collect();
            format!("{}: {}", message.role.as_str(), parts.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten a thread history into chat-completion messages.
///
/// Messages with no renderable content are dropped. If nothing survives, the whole
/// history is collapsed into a single user prompt so the backend still gets a request.
pub fn to_provider_messages(messages: &[Message]) -> Vec<ProviderMessage> {
    let mapped: Vec<ProviderMessage> = messages
        .iter()
        .filter_map(|message| {
            let content = message
                .parts
                .iter()
                .map(part_to_prompt_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            let content = content.trim();

            (!content.is_empty()).then(|| ProviderMessage {
                role: message.role.as_str().to_string(),
                content: content.to_string(),
            })
        })
        .collect();

    if mapped.is_empty() {
        return vec![ProviderMessage {
            role: "user".to_string(),
            content: to_prompt(messages),
        }];
    }

    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tether_types::{Role, ToolState};

    #[test]
    fn test_placeholders_for_non_text_parts() {
        let parts = vec![
            MessagePart::Attachment {
                attachment_id: "att_1".to_string(),
                url: None,
                mime_type: None,
                name: Some("cat.png".to_string()),
                size_bytes: None,
            },
            MessagePart::File {
                url: "/f".to_string(),
                media_type: "application/pdf".to_string(),
                name: None,
            },
            MessagePart::Tool {
                tool_name: "search".to_string(),
                tool_call_id: "c1".to_string(),
                state: ToolState::InputAvailable,
                input: None,
                output: None,
            },
        ];
        let rendered: Vec<String> = parts.iter().map(part_to_prompt_text).collect();

        assert_eq!(
            rendered,
            vec!["[attachment:cat.png]", "[file:application/pdf]", "[tool:search:input-available]"]
        );
    }

    #[test]
    fn test_skips_empty_messages() {
        let now = Utc::now();
        let messages = vec![
            Message::user_text("m1", "t1", "hello", now),
            Message::new("m2", "t1", Role::Assistant, vec![MessagePart::text("  ")], now),
        ];

        let flattened = to_provider_messages(&messages);
        assert_eq!(flattened.len(), 1);
        assert_eq!(flattened[0].role, "user");
        assert_eq!(flattened[0].content, "hello");
    }

    #[test]
    fn test_all_empty_collapses_to_prompt() {
        let messages = vec![Message::new("m1", "t1", Role::User, vec![], Utc::now())];
        let flattened = to_provider_messages(&messages);

        assert_eq!(flattened.len(), 1);
        assert_eq!(flattened[0].content, "user: ");
    }
}
