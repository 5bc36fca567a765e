//! Message formatting utilities for CLI display.

use serde_json::Value;

use stationhub_shared::time::timestamp_to_rfc3339;

use crate::message::{Message, MessageKind};

/// Message formatter for terminal display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a single chat or system message.
    pub fn format_message(message: &Message) -> String {
        let timestamp_str = timestamp_to_rfc3339(message.timestamp);
        match message.kind {
            MessageKind::System => format!("\n* {} ({})\n", message.body, timestamp_str),
            _ => format!(
                "\n\n------------------------------------------------------------\n\
                 @{}: {}\n\
                 sent at {}\n\
                 ------------------------------------------------------------\n",
                message.sender_name, message.body, timestamp_str
            ),
        }
    }

    /// Format a history replay as a block of messages.
    pub fn format_history(messages: &[Message]) -> String {
        let mut output = String::new();
        output.push_str("\n\n============================================================\n");
        output.push_str("Recent messages:\n");

        if messages.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            for message in messages {
                let timestamp_str = timestamp_to_rfc3339(message.timestamp);
                output.push_str(&format!(
                    "@{}: {} ({})\n",
                    message.sender_name, message.body, timestamp_str
                ));
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format a domain notification with its raw payload.
    pub fn format_notification(name: &str, payload: &[Value]) -> String {
        let rendered = payload
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("\n! {}: {}\n", name, rendered)
    }

    /// Format a degraded-connection notice.
    pub fn format_connection_limited(reason: &str) -> String {
        format!("\n! connection limited: {}\n", reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(sender: &str, body: &str, kind: MessageKind) -> Message {
        Message {
            id: None,
            body: body.to_string(),
            sender_name: sender.to_string(),
            sender_id: None,
            timestamp: 1700000000000,
            room_key: None,
            kind,
        }
    }

    #[test]
    fn test_format_message_includes_sender_and_body() {
        // given:
        let msg = message("alice", "hello", MessageKind::Ordinary);

        // when:
        let formatted = MessageFormatter::format_message(&msg);

        // then:
        assert!(formatted.contains("@alice: hello"));
        assert!(formatted.contains("sent at"));
    }

    #[test]
    fn test_format_system_message_uses_notice_style() {
        // given:
        let msg = message("system", "Connection lost.", MessageKind::System);

        // when:
        let formatted = MessageFormatter::format_message(&msg);

        // then:
        assert!(formatted.starts_with("\n* Connection lost."));
        assert!(!formatted.contains('@'));
    }

    #[test]
    fn test_format_empty_history() {
        // given:
        let messages: Vec<Message> = Vec::new();

        // when:
        let formatted = MessageFormatter::format_history(&messages);

        // then:
        assert!(formatted.contains("(No messages yet)"));
    }

    #[test]
    fn test_format_history_lists_every_message() {
        // given:
        let messages = vec![
            message("alice", "hi", MessageKind::Ordinary),
            message("bob", "hey", MessageKind::Ordinary),
        ];

        // when:
        let formatted = MessageFormatter::format_history(&messages);

        // then:
        assert!(formatted.contains("@alice: hi"));
        assert!(formatted.contains("@bob: hey"));
    }

    #[test]
    fn test_format_notification_renders_payload() {
        // given / when:
        let formatted = MessageFormatter::format_notification("UnreadMessageCount", &[json!(3)]);

        // then:
        assert!(formatted.contains("UnreadMessageCount"));
        assert!(formatted.contains('3'));
    }
}
