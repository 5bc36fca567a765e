//! Transport seam between the client and the wire.
//!
//! The client owns exactly one [`TransportSession`] at a time and consumes
//! it as a stream of [`TransportEvent`]s. The production implementation is
//! [`ws::WsTransport`]; tests substitute scripted implementations.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::protocol::HubFrame;

pub mod ws;

pub use ws::WsTransport;

/// Inbound activity on a session.
#[derive(Debug)]
pub enum TransportEvent {
    /// A parsed hub frame
    Frame(HubFrame),
    /// The session closed; emitted once, then the event stream ends
    Closed { reason: Option<String> },
}

/// Dials hub endpoints.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Session: TransportSession;

    /// Open a session. `endpoint` already carries any room query
    /// parameters; the access token is attached by the implementation.
    async fn connect(
        &self,
        endpoint: &str,
        access_token: &str,
    ) -> Result<Self::Session, ClientError>;
}

/// One live hub session.
#[async_trait]
pub trait TransportSession: Send + 'static {
    /// Invoke a hub method.
    async fn invoke(&mut self, frame: HubFrame) -> Result<(), ClientError>;

    /// Next inbound event. Returns `None` after `Closed` has been emitted.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Close the session. Idempotent.
    async fn close(&mut self);
}
