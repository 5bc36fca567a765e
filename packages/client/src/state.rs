//! Connection state machine.
//!
//! `Disconnected -> Connecting -> Connected`, with transient losses looping
//! through `Reconnecting` and the reconnect policy. Any state can drop to
//! `Disconnected` on an explicit stop. `Exhausted` is terminal until the
//! caller connects again by hand.

use std::fmt;

/// Lifecycle state of the one transport session a client owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// The reconnect policy gave up; a manual connect is required
    Exhausted,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    /// Whether a session is live or being established.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting
                | ConnectionState::Connected
                | ConnectionState::Reconnecting
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::Exhausted => "exhausted",
        };
        write!(f, "{}", label)
    }
}

/// Whether a transport close observed in `state` should trigger the
/// reconnect policy. Clean shutdowns never reconnect.
pub fn should_schedule_reconnect(state: ConnectionState, clean_shutdown: bool) -> bool {
    !clean_shutdown && state.is_active()
}
