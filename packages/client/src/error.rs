//! Error types for the hub messaging client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// No access token was available at connect time. The caller must
    /// re-authenticate; the client never retries this on its own.
    #[error("no access token available; connect aborted")]
    AuthMissing,

    /// Establishing the transport session failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A hub invocation (send, join, leave, mark-read) failed
    #[error("hub invocation '{method}' failed: {reason}")]
    InvokeFailed { method: String, reason: String },

    /// The transport closed while an operation was in progress
    #[error("transport closed unexpectedly")]
    TransportClosed,

    /// The background worker task is gone (client was dropped or panicked)
    #[error("client worker has stopped")]
    ClientStopped,
}

impl ClientError {
    /// Build an `InvokeFailed` for the given hub method.
    pub fn invoke(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvokeFailed {
            method: method.into(),
            reason: reason.into(),
        }
    }
}
