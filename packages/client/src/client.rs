//! Public client handle and builder.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use stationhub_shared::time::{Clock, SystemClock};

use crate::auth::{StaticTokenProvider, TokenProvider};
use crate::error::ClientError;
use crate::message::{Message, RoomKey};
use crate::profile::HubProfile;
use crate::reconnect::ReconnectPolicy;
use crate::state::ConnectionState;
use crate::transport::{Transport, WsTransport};
use crate::worker::{Command, Worker, WorkerSettings};

/// Most-recent buffer size matching the chat widgets of the web UI.
const DEFAULT_BUFFER_CAP: usize = 10;

/// Delay between connect and the history-load invocation.
const DEFAULT_HISTORY_DELAY: Duration = Duration::from_millis(300);

const COMMAND_QUEUE_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events delivered to stream subscribers.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A single message, appended to the room buffer
    Message(Message),
    /// A history replay; the payload is the buffer after replacement
    History(Vec<Message>),
    /// A domain notification with its raw hub payload
    Notification { name: String, payload: Vec<Value> },
    /// The connection is degraded: a reconnect is scheduled or the
    /// policy has given up
    ConnectionLimited { reason: String },
}

/// Handle to one hub connection.
///
/// Cloning the handle shares the underlying connection; the background
/// worker stops once every handle is dropped.
#[derive(Clone)]
pub struct HubClient {
    commands: mpsc::Sender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    events_tx: broadcast::Sender<ClientEvent>,
}

impl HubClient {
    /// Start building a client for the given hub.
    pub fn builder(profile: HubProfile, base_url: impl Into<String>) -> HubClientBuilder {
        HubClientBuilder {
            profile,
            base_url: base_url.into(),
            transport: WsTransport::new(),
            tokens: Arc::new(StaticTokenProvider::anonymous()),
            clock: Arc::new(SystemClock),
            policy: ReconnectPolicy::default(),
            sender_name: "anonymous".to_string(),
            buffer_cap: Some(DEFAULT_BUFFER_CAP),
            history_delay: DEFAULT_HISTORY_DELAY,
        }
    }

    /// Connect to the hub with the given room context. A no-op when
    /// already connected to the same room.
    pub async fn connect(&self, room: RoomKey) -> Result<(), ClientError> {
        self.request(|done| Command::Connect { room, done }).await
    }

    /// Stop the transport. Idempotent.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.request(|done| Command::Disconnect { done }).await
    }

    /// Join a room, connecting first when necessary.
    pub async fn join_room(&self, room: RoomKey) -> Result<(), ClientError> {
        self.request(|done| Command::JoinRoom { room, done }).await
    }

    /// Leave a room. Best-effort; errors are logged, not returned.
    pub async fn leave_room(&self, room: RoomKey) -> Result<(), ClientError> {
        self.request(|done| Command::LeaveRoom { room, done }).await
    }

    /// Send a message to the current room, connecting first when
    /// necessary. Retries exactly once through a reconnect on failure.
    pub async fn send_message(&self, body: impl Into<String>) -> Result<(), ClientError> {
        let body = body.into();
        self.request(|done| Command::Send { body, done }).await
    }

    /// Mark a delivery chat as read.
    pub async fn mark_read(&self, chat_id: i64) -> Result<(), ClientError> {
        self.request(|done| Command::MarkRead { chat_id, done })
            .await
    }

    /// Snapshot of the current room buffer.
    pub async fn recent_messages(&self) -> Result<Vec<Message>, ClientError> {
        self.request(|done| Command::Snapshot { done }).await
    }

    /// Subscribe to the message stream. Each subscriber gets every event
    /// from the point of subscription onward.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events_tx.subscribe()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<R, ClientError>>) -> Command,
    ) -> Result<R, ClientError> {
        let (done, response) = oneshot::channel();
        self.commands
            .send(build(done))
            .await
            .map_err(|_| ClientError::ClientStopped)?;
        response.await.map_err(|_| ClientError::ClientStopped)?
    }
}

/// Builder for [`HubClient`].
pub struct HubClientBuilder<T: Transport = WsTransport> {
    profile: HubProfile,
    base_url: String,
    transport: T,
    tokens: Arc<dyn TokenProvider>,
    clock: Arc<dyn Clock>,
    policy: ReconnectPolicy,
    sender_name: String,
    buffer_cap: Option<usize>,
    history_delay: Duration,
}

impl<T: Transport> HubClientBuilder<T> {
    /// Substitute the transport implementation (tests use scripted ones).
    pub fn transport<U: Transport>(self, transport: U) -> HubClientBuilder<U> {
        HubClientBuilder {
            profile: self.profile,
            base_url: self.base_url,
            transport,
            tokens: self.tokens,
            clock: self.clock,
            policy: self.policy,
            sender_name: self.sender_name,
            buffer_cap: self.buffer_cap,
            history_delay: self.history_delay,
        }
    }

    pub fn token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Name attached to outbound messages.
    pub fn sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self
    }

    /// Cap on the local message buffer; `None` keeps everything.
    pub fn buffer_cap(mut self, cap: Option<usize>) -> Self {
        self.buffer_cap = cap;
        self
    }

    /// Delay between connecting and requesting history.
    pub fn history_delay(mut self, delay: Duration) -> Self {
        self.history_delay = delay;
        self
    }

    /// Spawn the background worker and return the handle.
    pub fn spawn(self) -> HubClient {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let settings = WorkerSettings {
            profile: self.profile,
            base_url: self.base_url,
            tokens: self.tokens,
            clock: self.clock,
            policy: self.policy,
            sender_name: self.sender_name,
            history_delay: self.history_delay,
            buffer_cap: self.buffer_cap,
        };

        let worker = Worker::new(
            self.transport,
            settings,
            command_rx,
            state_tx,
            events_tx.clone(),
        );
        tokio::spawn(worker.run());

        HubClient {
            commands: command_tx,
            state_rx,
            events_tx,
        }
    }
}
