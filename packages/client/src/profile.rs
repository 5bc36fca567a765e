//! Hub profiles: the per-hub configuration of the shared client.
//!
//! The platform runs four hubs that differ only in endpoint path, room-key
//! shape, and event/invocation names. Each profile captures one hub's
//! contract so the connection, reconnection, and dispatch logic is written
//! exactly once.

use serde_json::Value;

use crate::message::RoomKey;
use crate::protocol::{events, invocations};

/// How an inbound hub event is consumed locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    /// A single message; appended to the room buffer
    Message,
    /// A history replay; replaces the room buffer
    History,
    /// A domain notification passed through with its raw payload
    Domain,
    /// Not part of this hub's contract; logged and dropped
    Unknown,
}

/// Contract of one hub endpoint.
#[derive(Debug, Clone)]
pub struct HubProfile {
    name: &'static str,
    hub_path: &'static str,
    /// Query parameter carrying the room id on the connect URL, if any
    room_query: Option<&'static str>,
    message_events: &'static [&'static str],
    history_events: &'static [&'static str],
    domain_events: &'static [&'static str],
    join_method: Option<&'static str>,
    leave_method: Option<&'static str>,
    send_method: Option<&'static str>,
    load_method: Option<&'static str>,
    mark_read_method: Option<&'static str>,
    /// Whether send/load invocations carry the room key as first argument
    args_include_room: bool,
}

impl HubProfile {
    /// Per-train chat rooms, joined by train id.
    pub fn train_chat() -> Self {
        Self {
            name: "train-chat",
            hub_path: "TrainChatHub",
            room_query: Some("trainId"),
            message_events: &[events::RECEIVE_MESSAGE],
            history_events: &[events::LOAD_MESSAGES, events::CHAT_HISTORY],
            domain_events: &[events::RECEIVE_TRAIN_UPDATE],
            join_method: Some(invocations::JOIN_TRAIN_GROUP),
            leave_method: Some(invocations::LEAVE_TRAIN_GROUP),
            send_method: Some(invocations::SEND_MESSAGE),
            load_method: Some(invocations::LOAD_RECENT_MESSAGES),
            mark_read_method: None,
            args_include_room: true,
        }
    }

    /// The single site-wide chat room.
    pub fn public_chat() -> Self {
        Self {
            name: "public-chat",
            hub_path: "PublicChatHub",
            room_query: None,
            message_events: &[events::RECEIVE_MESSAGE],
            history_events: &[events::LOAD_MESSAGES, events::CHAT_HISTORY],
            domain_events: &[],
            join_method: None,
            leave_method: None,
            send_method: Some(invocations::SEND_MESSAGE),
            load_method: Some(invocations::LOAD_RECENT_MESSAGES),
            mark_read_method: None,
            args_include_room: false,
        }
    }

    /// Per-delivery chat rooms with read receipts and status events.
    pub fn delivery_chat() -> Self {
        Self {
            name: "delivery-chat",
            hub_path: "DeliveryChatHub",
            room_query: None,
            message_events: &[events::MESSAGE_RECEIVED],
            history_events: &[events::CHAT_HISTORY],
            domain_events: &[
                events::CHAT_STATUS,
                events::UNREAD_MESSAGE_COUNT,
                events::USER_CHATS,
            ],
            join_method: Some(invocations::JOIN_CHAT),
            leave_method: Some(invocations::LEAVE_CHAT),
            send_method: Some(invocations::SEND_MESSAGE),
            load_method: Some(invocations::LOAD_RECENT_MESSAGES),
            mark_read_method: Some(invocations::MARK_MESSAGES_AS_READ),
            args_include_room: true,
        }
    }

    /// The receive-only notification hub.
    pub fn notifications() -> Self {
        Self {
            name: "notifications",
            hub_path: "NotificationHub",
            room_query: None,
            message_events: &[],
            history_events: &[],
            domain_events: &[
                events::UNREAD_MESSAGE_COUNT,
                events::REQUEST_ACCEPTED,
                events::REQUEST_REJECTED,
                events::OFFER_STATUS_CHANGED,
                events::RECEIVE_TRAIN_UPDATE,
            ],
            join_method: None,
            leave_method: None,
            send_method: None,
            load_method: None,
            mark_read_method: None,
            args_include_room: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build the connect URL for the given room context.
    pub fn endpoint(&self, base_url: &str, room: &RoomKey) -> String {
        let base = base_url.trim_end_matches('/');
        match (self.room_query, room.id()) {
            (Some(query), Some(id)) => format!("{}/{}?{}={}", base, self.hub_path, query, id),
            _ => format!("{}/{}", base, self.hub_path),
        }
    }

    /// Map an inbound event name to its local dispatch class.
    pub fn classify(&self, target: &str) -> EventClass {
        if self.message_events.contains(&target) {
            EventClass::Message
        } else if self.history_events.contains(&target) {
            EventClass::History
        } else if self.domain_events.contains(&target) {
            EventClass::Domain
        } else {
            EventClass::Unknown
        }
    }

    /// Join invocation for the room, if this hub has explicit membership.
    pub fn join_call(&self, room: &RoomKey) -> Option<(&'static str, Vec<Value>)> {
        let method = self.join_method?;
        let arg = room.as_arg()?;
        Some((method, vec![arg]))
    }

    /// Leave invocation for the room, if this hub has explicit membership.
    pub fn leave_call(&self, room: &RoomKey) -> Option<(&'static str, Vec<Value>)> {
        let method = self.leave_method?;
        let arg = room.as_arg()?;
        Some((method, vec![arg]))
    }

    /// Send invocation with this hub's positional argument order.
    pub fn send_call(
        &self,
        room: &RoomKey,
        sender_name: &str,
        body: &str,
    ) -> Option<(&'static str, Vec<Value>)> {
        let method = self.send_method?;
        let mut args = Vec::with_capacity(3);
        if self.args_include_room
            && let Some(room_arg) = room.as_arg()
        {
            args.push(room_arg);
        }
        args.push(Value::from(sender_name));
        args.push(Value::from(body));
        Some((method, args))
    }

    /// History-load invocation for the room.
    pub fn load_call(&self, room: &RoomKey) -> Option<(&'static str, Vec<Value>)> {
        let method = self.load_method?;
        let mut args = Vec::with_capacity(1);
        if self.args_include_room
            && let Some(room_arg) = room.as_arg()
        {
            args.push(room_arg);
        }
        Some((method, args))
    }

    /// Read-receipt invocation, delivery hub only.
    pub fn mark_read_call(&self, chat_id: i64) -> Option<(&'static str, Vec<Value>)> {
        let method = self.mark_read_method?;
        Some((method, vec![Value::from(chat_id)]))
    }
}
