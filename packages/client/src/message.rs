//! Message and room types shared by all hub profiles.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies the logical channel a connection is scoped to.
///
/// One connection carries one room context at a time: switching rooms on a
/// train or delivery hub opens a fresh connection rather than multiplexing
/// rooms on a single socket. The public chat and notification hubs always
/// use the implicit global room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomKey {
    /// The implicit hub-wide room (public chat, notifications)
    Global,
    /// A per-train chat room
    Train(i64),
    /// A per-delivery chat room
    Chat(i64),
}

impl RoomKey {
    /// Numeric room id carried on the wire, if this room has one.
    pub fn id(&self) -> Option<i64> {
        match self {
            RoomKey::Global => None,
            RoomKey::Train(id) | RoomKey::Chat(id) => Some(*id),
        }
    }

    /// JSON argument value used in hub invocations for this room.
    pub fn as_arg(&self) -> Option<Value> {
        self.id().map(Value::from)
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::Global => write!(f, "global"),
            RoomKey::Train(id) => write!(f, "train:{}", id),
            RoomKey::Chat(id) => write!(f, "chat:{}", id),
        }
    }
}

/// Distinguishes ordinary chat traffic from locally generated system
/// notices and history replays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Ordinary,
    System,
    History,
}

/// One chat message, inbound from the hub or generated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Hub-assigned id; absent for locally generated system messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub body: String,
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<i64>,
    /// Unix timestamp in UTC milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_key: Option<i64>,
    #[serde(default)]
    pub kind: MessageKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_key_display() {
        // given / when / then:
        assert_eq!(RoomKey::Global.to_string(), "global");
        assert_eq!(RoomKey::Train(5).to_string(), "train:5");
        assert_eq!(RoomKey::Chat(12).to_string(), "chat:12");
    }

    #[test]
    fn test_room_key_as_arg() {
        // given / when / then:
        assert_eq!(RoomKey::Global.as_arg(), None);
        assert_eq!(RoomKey::Train(5).as_arg(), Some(Value::from(5)));
        assert_eq!(RoomKey::Chat(12).as_arg(), Some(Value::from(12)));
    }

    #[test]
    fn test_message_deserializes_camel_case_payload() {
        // given: a payload in the form the hub pushes
        let raw = r#"{
            "id": 42,
            "body": "Arriving at platform 3",
            "senderName": "alice",
            "senderId": 7,
            "timestamp": 1700000000000,
            "roomKey": 5
        }"#;

        // when:
        let msg: Message = serde_json::from_str(raw).unwrap();

        // then:
        assert_eq!(msg.id, Some(42));
        assert_eq!(msg.body, "Arriving at platform 3");
        assert_eq!(msg.sender_name, "alice");
        assert_eq!(msg.sender_id, Some(7));
        assert_eq!(msg.timestamp, 1700000000000);
        assert_eq!(msg.room_key, Some(5));
        assert_eq!(msg.kind, MessageKind::Ordinary);
    }

    #[test]
    fn test_message_tolerates_minimal_payload() {
        // given: only the required fields
        let raw = r#"{"body": "hi", "senderName": "bob", "timestamp": 1}"#;

        // when:
        let msg: Message = serde_json::from_str(raw).unwrap();

        // then:
        assert_eq!(msg.id, None);
        assert_eq!(msg.room_key, None);
        assert_eq!(msg.kind, MessageKind::Ordinary);
    }
}
