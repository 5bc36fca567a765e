//! WebSocket transport over tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::error::ClientError;
use crate::protocol::HubFrame;

use super::{Transport, TransportEvent, TransportSession};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport dialing `ws://` / `wss://` hub endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WsTransport {
    type Session = WsSession;

    async fn connect(
        &self,
        endpoint: &str,
        access_token: &str,
    ) -> Result<Self::Session, ClientError> {
        // The token travels as a query parameter, fetched fresh per
        // connection attempt.
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!("{}{}access_token={}", endpoint, separator, access_token);

        let (ws_stream, _response) = connect_async(&url)
            .await
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;

        let (write, read) = ws_stream.split();
        Ok(WsSession {
            write,
            read,
            closed: false,
        })
    }
}

/// One live WebSocket session.
pub struct WsSession {
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
    closed: bool,
}

#[async_trait]
impl TransportSession for WsSession {
    async fn invoke(&mut self, frame: HubFrame) -> Result<(), ClientError> {
        let method = frame.target.clone();
        let json = serde_json::to_string(&frame)
            .map_err(|e| ClientError::invoke(method.clone(), e.to_string()))?;

        self.write
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| ClientError::invoke(method, e.to_string()))
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.closed {
            return None;
        }

        while let Some(message) = self.read.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<HubFrame>(&text) {
                    Ok(frame) => return Some(TransportEvent::Frame(frame)),
                    Err(e) => {
                        tracing::warn!("Discarding unparseable hub frame: {}", e);
                    }
                },
                Ok(Message::Close(close_frame)) => {
                    self.closed = true;
                    return Some(TransportEvent::Closed {
                        reason: close_frame.map(|f| f.reason.as_str().to_string()),
                    });
                }
                Ok(Message::Binary(data)) => {
                    tracing::debug!("Ignoring {} byte binary frame", data.len());
                }
                Ok(_) => {
                    // ping/pong handled by the library
                }
                Err(e) => {
                    self.closed = true;
                    return Some(TransportEvent::Closed {
                        reason: Some(e.to_string()),
                    });
                }
            }
        }

        self.closed = true;
        Some(TransportEvent::Closed { reason: None })
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.write.send(Message::Close(None)).await {
            tracing::debug!("Close handshake failed: {}", e);
        }
        let _ = self.write.close().await;
    }
}
