//! Wire protocol for hub communication.
//!
//! Every hub speaks the same framing: JSON text frames with a `target`
//! naming the event or invocation and a positional `arguments` array.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound event names pushed by the hubs.
pub mod events {
    pub const RECEIVE_MESSAGE: &str = "ReceiveMessage";
    pub const MESSAGE_RECEIVED: &str = "MessageReceived";
    pub const LOAD_MESSAGES: &str = "LoadMessages";
    pub const CHAT_HISTORY: &str = "ChatHistory";
    pub const CHAT_STATUS: &str = "ChatStatus";
    pub const UNREAD_MESSAGE_COUNT: &str = "UnreadMessageCount";
    pub const USER_CHATS: &str = "UserChats";
    pub const REQUEST_ACCEPTED: &str = "RequestAccepted";
    pub const REQUEST_REJECTED: &str = "RequestRejected";
    pub const OFFER_STATUS_CHANGED: &str = "OfferStatusChanged";
    pub const RECEIVE_TRAIN_UPDATE: &str = "ReceiveTrainUpdate";
}

/// Outbound invocation names accepted by the hubs.
pub mod invocations {
    pub const SEND_MESSAGE: &str = "SendMessage";
    pub const LOAD_RECENT_MESSAGES: &str = "LoadRecentMessages";
    pub const JOIN_TRAIN_GROUP: &str = "JoinTrainGroup";
    pub const LEAVE_TRAIN_GROUP: &str = "LeaveTrainGroup";
    pub const JOIN_CHAT: &str = "JoinChatAsync";
    pub const LEAVE_CHAT: &str = "LeaveChatAsync";
    pub const MARK_MESSAGES_AS_READ: &str = "MarkMessagesAsReadAsync";
}

/// One JSON text frame, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubFrame {
    pub target: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl HubFrame {
    pub fn new(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_round_trips_through_json() {
        // given:
        let frame = HubFrame::new(invocations::SEND_MESSAGE, vec![json!("alice"), json!("hi")]);

        // when:
        let raw = serde_json::to_string(&frame).unwrap();
        let parsed: HubFrame = serde_json::from_str(&raw).unwrap();

        // then:
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_frame_with_missing_arguments_defaults_to_empty() {
        // given: a bare event frame as some hub pushes send it
        let raw = r#"{"target": "UnreadMessageCount"}"#;

        // when:
        let frame: HubFrame = serde_json::from_str(raw).unwrap();

        // then:
        assert_eq!(frame.target, events::UNREAD_MESSAGE_COUNT);
        assert!(frame.arguments.is_empty());
    }
}
