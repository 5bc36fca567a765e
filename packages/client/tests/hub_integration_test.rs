//! End-to-end tests of the WebSocket transport against an in-process hub.
//!
//! A minimal axum server speaks the hub framing: `SendMessage` is echoed
//! back as `ReceiveMessage`, `LoadRecentMessages` answers with a canned
//! `ChatHistory`. The client runs its production transport against it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    extract::{
        Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tokio::time::timeout;

use stationhub_client::protocol::{HubFrame, events, invocations};
use stationhub_client::{ClientEvent, HubClient, HubProfile, Message, RoomKey, StaticTokenProvider};

#[derive(Default)]
struct HubState {
    tokens_seen: Mutex<Vec<String>>,
}

async fn hub_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<HubState>>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if let Some(token) = params.get("access_token") {
        state.tokens_seen.lock().unwrap().push(token.clone());
    }
    ws.on_upgrade(serve_hub)
}

async fn serve_hub(mut socket: WebSocket) {
    while let Some(Ok(message)) = socket.recv().await {
        let WsMessage::Text(text) = message else {
            continue;
        };
        let Ok(frame) = serde_json::from_str::<HubFrame>(&text) else {
            continue;
        };

        let reply = match frame.target.as_str() {
            invocations::SEND_MESSAGE => {
                let sender = frame
                    .arguments
                    .first()
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                let body = frame
                    .arguments
                    .get(1)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                Some(HubFrame::new(
                    events::RECEIVE_MESSAGE,
                    vec![json!({
                        "id": 1,
                        "body": body,
                        "senderName": sender,
                        "timestamp": 1700000000000i64,
                    })],
                ))
            }
            invocations::LOAD_RECENT_MESSAGES => Some(HubFrame::new(
                events::CHAT_HISTORY,
                vec![json!([
                    { "body": "welcome", "senderName": "hub", "timestamp": 1700000000000i64 }
                ])],
            )),
            _ => None,
        };

        if let Some(reply) = reply {
            let raw = serde_json::to_string(&reply).unwrap();
            if socket.send(WsMessage::Text(raw.into())).await.is_err() {
                break;
            }
        }
    }
}

async fn start_hub() -> (SocketAddr, Arc<HubState>) {
    let state = Arc::new(HubState::default());
    let app = Router::new()
        .route("/PublicChatHub", get(hub_handler))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

async fn next_message(stream: &mut tokio::sync::broadcast::Receiver<ClientEvent>) -> Message {
    loop {
        if let ClientEvent::Message(message) = stream.recv().await.unwrap() {
            return message;
        }
    }
}

async fn next_history(stream: &mut tokio::sync::broadcast::Receiver<ClientEvent>) -> Vec<Message> {
    loop {
        if let ClientEvent::History(messages) = stream.recv().await.unwrap() {
            return messages;
        }
    }
}

#[tokio::test]
async fn test_send_and_receive_over_websocket() {
    // given: a live hub and a client on the production transport
    let (addr, state) = start_hub().await;
    let client = HubClient::builder(HubProfile::public_chat(), format!("ws://{}", addr))
        .token_provider(Arc::new(StaticTokenProvider::with_token("integration-token")))
        .sender_name("alice")
        .history_delay(Duration::from_secs(3600))
        .spawn();
    client.connect(RoomKey::Global).await.unwrap();
    let mut stream = client.subscribe();

    // when:
    client.send_message("hello over the wire").await.unwrap();

    // then: the hub echo comes back through the message stream
    let message = timeout(Duration::from_secs(5), next_message(&mut stream))
        .await
        .expect("timed out waiting for the echoed message");
    assert_eq!(message.body, "hello over the wire");
    assert_eq!(message.sender_name, "alice");

    // and the token traveled on the connect URL
    assert_eq!(
        state.tokens_seen.lock().unwrap().as_slice(),
        ["integration-token".to_string()]
    );

    client.disconnect().await.unwrap();
}

#[tokio::test]
async fn test_history_loads_shortly_after_connect() {
    // given:
    let (addr, _state) = start_hub().await;
    let client = HubClient::builder(HubProfile::public_chat(), format!("ws://{}", addr))
        .token_provider(Arc::new(StaticTokenProvider::with_token("integration-token")))
        .history_delay(Duration::from_millis(50))
        .spawn();
    let mut stream = client.subscribe();

    // when:
    client.connect(RoomKey::Global).await.unwrap();

    // then: the delayed history load replaces the buffer
    let history = timeout(Duration::from_secs(5), next_history(&mut stream))
        .await
        .expect("timed out waiting for history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].body, "welcome");
    assert_eq!(history[0].sender_name, "hub");

    let buffered = client.recent_messages().await.unwrap();
    assert_eq!(buffered.len(), 1);
    assert_eq!(buffered[0].body, "welcome");
}
