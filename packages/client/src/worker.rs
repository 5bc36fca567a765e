//! Background worker owning the transport session.
//!
//! All connection, membership, and dispatch work happens on this one task.
//! Commands from [`crate::client::HubClient`] handles queue on a channel,
//! so connects are serialized: a second `connect()` issued while the first
//! is in flight waits behind it and then observes `Connected`. At most one
//! live session exists per client at any point.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::Instant;

use stationhub_shared::time::Clock;

use crate::auth::TokenProvider;
use crate::buffer::MessageBuffer;
use crate::client::ClientEvent;
use crate::error::ClientError;
use crate::message::{Message, MessageKind, RoomKey};
use crate::profile::{EventClass, HubProfile};
use crate::protocol::HubFrame;
use crate::reconnect::ReconnectPolicy;
use crate::state::{ConnectionState, should_schedule_reconnect};
use crate::transport::{Transport, TransportEvent, TransportSession};

/// Requests from client handles to the worker.
pub(crate) enum Command {
    Connect {
        room: RoomKey,
        done: oneshot::Sender<Result<(), ClientError>>,
    },
    Disconnect {
        done: oneshot::Sender<Result<(), ClientError>>,
    },
    JoinRoom {
        room: RoomKey,
        done: oneshot::Sender<Result<(), ClientError>>,
    },
    LeaveRoom {
        room: RoomKey,
        done: oneshot::Sender<Result<(), ClientError>>,
    },
    Send {
        body: String,
        done: oneshot::Sender<Result<(), ClientError>>,
    },
    MarkRead {
        chat_id: i64,
        done: oneshot::Sender<Result<(), ClientError>>,
    },
    Snapshot {
        done: oneshot::Sender<Result<Vec<Message>, ClientError>>,
    },
}

/// Configuration handed to the worker at spawn time.
pub(crate) struct WorkerSettings {
    pub(crate) profile: HubProfile,
    pub(crate) base_url: String,
    pub(crate) tokens: Arc<dyn TokenProvider>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) sender_name: String,
    pub(crate) history_delay: Duration,
    pub(crate) buffer_cap: Option<usize>,
}

enum Tick {
    Command(Option<Command>),
    Transport(Option<TransportEvent>),
    ReconnectDue(u64),
    HistoryDue,
}

pub(crate) struct Worker<T: Transport> {
    transport: T,
    profile: HubProfile,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
    clock: Arc<dyn Clock>,
    policy: ReconnectPolicy,
    sender_name: String,
    history_delay: Duration,
    commands: mpsc::Receiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    events_tx: broadcast::Sender<ClientEvent>,
    buffer: MessageBuffer,
    session: Option<T::Session>,
    room: RoomKey,
    /// Bumped on every connect and explicit disconnect; scheduled
    /// reconnects carry the generation they were scheduled under and are
    /// discarded when stale, so a torn-down connection cannot resurrect.
    generation: u64,
    attempt: u32,
    reconnect_at: Option<(Instant, u64)>,
    history_at: Option<Instant>,
}

impl<T: Transport> Worker<T> {
    pub(crate) fn new(
        transport: T,
        settings: WorkerSettings,
        commands: mpsc::Receiver<Command>,
        state_tx: watch::Sender<ConnectionState>,
        events_tx: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            transport,
            profile: settings.profile,
            base_url: settings.base_url,
            tokens: settings.tokens,
            clock: settings.clock,
            policy: settings.policy,
            sender_name: settings.sender_name,
            history_delay: settings.history_delay,
            commands,
            state_tx,
            events_tx,
            buffer: MessageBuffer::new(settings.buffer_cap),
            session: None,
            room: RoomKey::Global,
            generation: 0,
            attempt: 0,
            reconnect_at: None,
            history_at: None,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            match self.next_tick().await {
                Tick::Command(Some(command)) => self.handle_command(command).await,
                Tick::Command(None) => break,
                Tick::Transport(event) => self.handle_transport(event).await,
                Tick::ReconnectDue(generation) => self.handle_reconnect_due(generation).await,
                Tick::HistoryDue => self.request_history().await,
            }
        }

        // All handles dropped; tear down cleanly.
        self.close_session().await;
        self.set_state(ConnectionState::Disconnected);
    }

    async fn next_tick(&mut self) -> Tick {
        let has_session = self.session.is_some();
        let reconnect = self.reconnect_at;
        let history = self.history_at;

        tokio::select! {
            command = self.commands.recv() => Tick::Command(command),
            event = Self::session_event(&mut self.session), if has_session => {
                Tick::Transport(event)
            }
            _ = Self::sleep_until(reconnect.map(|(at, _)| at)), if reconnect.is_some() => {
                Tick::ReconnectDue(reconnect.map(|(_, generation)| generation).unwrap_or(0))
            }
            _ = Self::sleep_until(history), if history.is_some() => Tick::HistoryDue,
        }
    }

    async fn session_event(session: &mut Option<T::Session>) -> Option<TransportEvent> {
        match session.as_mut() {
            Some(session) => session.next_event().await,
            None => std::future::pending().await,
        }
    }

    async fn sleep_until(deadline: Option<Instant>) {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect { room, done } => {
                let _ = done.send(self.connect(room).await);
            }
            Command::Disconnect { done } => {
                self.disconnect().await;
                let _ = done.send(Ok(()));
            }
            Command::JoinRoom { room, done } => {
                let _ = done.send(self.join_room(room).await);
            }
            Command::LeaveRoom { room, done } => {
                let _ = done.send(self.leave_room(room).await);
            }
            Command::Send { body, done } => {
                let _ = done.send(self.send_message(body).await);
            }
            Command::MarkRead { chat_id, done } => {
                let _ = done.send(self.mark_read(chat_id).await);
            }
            Command::Snapshot { done } => {
                let _ = done.send(Ok(self.buffer.snapshot()));
            }
        }
    }

    async fn connect(&mut self, room: RoomKey) -> Result<(), ClientError> {
        if self.state().is_connected() && self.session.is_some() && self.room == room {
            tracing::debug!("Already connected to {}; connect is a no-op", self.room);
            return Ok(());
        }

        if self.room != room {
            // One connection carries one room context; switching rooms
            // starts over with an empty buffer.
            self.buffer.clear();
        }
        self.room = room;
        self.attempt = 0;
        self.open_session(ConnectionState::Connecting).await
    }

    async fn disconnect(&mut self) {
        self.generation += 1;
        self.reconnect_at = None;
        self.history_at = None;
        self.attempt = 0;
        self.close_session().await;
        self.set_state(ConnectionState::Disconnected);
    }

    /// Tear down any existing session and dial a fresh one for the current
    /// room context. On success the room is auto-joined and a delayed
    /// history load is scheduled; on failure the reconnect policy decides
    /// what happens next.
    async fn open_session(&mut self, transitional: ConnectionState) -> Result<(), ClientError> {
        let Some(token) = self.tokens.token() else {
            tracing::error!(
                "No access token available; aborting {} connect",
                self.profile.name()
            );
            self.generation += 1;
            self.reconnect_at = None;
            self.history_at = None;
            self.close_session().await;
            self.set_state(ConnectionState::Disconnected);
            return Err(ClientError::AuthMissing);
        };

        self.generation += 1;
        self.reconnect_at = None;
        self.history_at = None;
        self.close_session().await;
        self.set_state(transitional);

        let endpoint = self.profile.endpoint(&self.base_url, &self.room);
        match self.transport.connect(&endpoint, &token).await {
            Ok(session) => {
                self.session = Some(session);
                self.attempt = 0;
                self.set_state(ConnectionState::Connected);
                tracing::info!("Connected to {} hub at {}", self.profile.name(), endpoint);
                self.join_current_room().await;
                self.history_at = Some(Instant::now() + self.history_delay);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Connecting to {} failed: {}", endpoint, e);
                self.schedule_reconnect();
                Err(e)
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        match self.policy.delay_for(self.attempt) {
            Some(delay) => {
                self.attempt += 1;
                self.set_state(ConnectionState::Reconnecting);
                self.reconnect_at = Some((Instant::now() + delay, self.generation));
                tracing::info!(
                    "Reconnecting to {} in {:?} (attempt {})",
                    self.profile.name(),
                    delay,
                    self.attempt
                );
                self.emit(ClientEvent::ConnectionLimited {
                    reason: format!("reconnecting in {:?}", delay),
                });
            }
            None => {
                self.reconnect_at = None;
                self.set_state(ConnectionState::Exhausted);
                tracing::error!(
                    "Giving up on {} after {} reconnect attempts",
                    self.profile.name(),
                    self.attempt
                );
                self.push_system_message("Connection lost. Reconnect attempts exhausted.");
                self.emit(ClientEvent::ConnectionLimited {
                    reason: "reconnect attempts exhausted".to_string(),
                });
            }
        }
    }

    async fn handle_reconnect_due(&mut self, generation: u64) {
        self.reconnect_at = None;
        if generation != self.generation {
            tracing::debug!(
                "Discarding stale reconnect (generation {} != {})",
                generation,
                self.generation
            );
            return;
        }
        // Errors feed back into the policy inside open_session.
        let _ = self.open_session(ConnectionState::Reconnecting).await;
    }

    async fn join_current_room(&mut self) {
        let Some((method, args)) = self.profile.join_call(&self.room) else {
            return;
        };
        if let Err(e) = self.invoke(method, args).await {
            tracing::warn!("Joining room {} failed: {}", self.room, e);
        }
    }

    async fn join_room(&mut self, room: RoomKey) -> Result<(), ClientError> {
        if !self.state().is_connected() || self.session.is_none() || self.room != room {
            // connect() joins the room as part of session setup; one
            // attempt only, never recursive.
            return self.connect(room).await;
        }
        match self.profile.join_call(&room) {
            Some((method, args)) => self.invoke(method, args).await,
            None => Ok(()),
        }
    }

    async fn leave_room(&mut self, room: RoomKey) -> Result<(), ClientError> {
        let Some((method, args)) = self.profile.leave_call(&room) else {
            return Ok(());
        };
        if !self.state().is_connected() || self.session.is_none() {
            tracing::debug!("Ignoring leave for {} while disconnected", room);
            return Ok(());
        }
        // Best-effort: failures are logged, never surfaced.
        if let Err(e) = self.invoke(method, args).await {
            tracing::warn!("Leaving room {} failed: {}", room, e);
        }
        Ok(())
    }

    async fn send_message(&mut self, body: String) -> Result<(), ClientError> {
        let Some((method, args)) = self.profile.send_call(&self.room, &self.sender_name, &body)
        else {
            return Err(ClientError::invoke(
                "SendMessage",
                format!("{} hub does not accept outbound messages", self.profile.name()),
            ));
        };

        if !self.state().is_connected() || self.session.is_none() {
            self.connect(self.room.clone()).await?;
        }

        match self.invoke(method, args.clone()).await {
            Ok(()) => Ok(()),
            Err(first) => {
                // Exactly one reconnect-then-retry, then give up.
                tracing::warn!("Send failed ({}); reconnecting and retrying once", first);
                self.open_session(ConnectionState::Reconnecting).await?;
                self.invoke(method, args).await
            }
        }
    }

    async fn mark_read(&mut self, chat_id: i64) -> Result<(), ClientError> {
        let Some((method, args)) = self.profile.mark_read_call(chat_id) else {
            return Ok(());
        };
        if !self.state().is_connected() || self.session.is_none() {
            self.connect(self.room.clone()).await?;
        }
        self.invoke(method, args).await
    }

    async fn request_history(&mut self) {
        self.history_at = None;
        if !self.state().is_connected() {
            return;
        }
        let Some((method, args)) = self.profile.load_call(&self.room) else {
            return;
        };
        if let Err(e) = self.invoke(method, args).await {
            tracing::warn!("History request for {} failed: {}", self.room, e);
        }
    }

    async fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<(), ClientError> {
        let Some(session) = self.session.as_mut() else {
            return Err(ClientError::invoke(method, "not connected"));
        };
        session.invoke(HubFrame::new(method, args)).await
    }

    async fn handle_transport(&mut self, event: Option<TransportEvent>) {
        match event {
            Some(TransportEvent::Frame(frame)) => self.dispatch_frame(frame),
            Some(TransportEvent::Closed { reason }) => {
                tracing::warn!(
                    "{} transport closed: {}",
                    self.profile.name(),
                    reason.as_deref().unwrap_or("no reason given")
                );
                self.session = None;
                if should_schedule_reconnect(self.state(), false) {
                    self.schedule_reconnect();
                }
            }
            None => {
                self.session = None;
            }
        }
    }

    fn dispatch_frame(&mut self, frame: HubFrame) {
        match self.profile.classify(&frame.target) {
            EventClass::Message => match frame.arguments.first() {
                Some(payload) => match serde_json::from_value::<Message>(payload.clone()) {
                    Ok(message) => {
                        self.buffer.append(message.clone());
                        self.emit(ClientEvent::Message(message));
                    }
                    Err(e) => tracing::warn!("Malformed {} payload: {}", frame.target, e),
                },
                None => tracing::warn!("{} event arrived without a payload", frame.target),
            },
            EventClass::History => {
                let messages: Vec<Message> = match frame.arguments.first() {
                    Some(payload) => match serde_json::from_value(payload.clone()) {
                        Ok(messages) => messages,
                        Err(e) => {
                            tracing::warn!("Malformed {} payload: {}", frame.target, e);
                            return;
                        }
                    },
                    None => Vec::new(),
                };
                self.buffer.replace(messages);
                self.emit(ClientEvent::History(self.buffer.snapshot()));
            }
            EventClass::Domain => {
                self.emit(ClientEvent::Notification {
                    name: frame.target,
                    payload: frame.arguments,
                });
            }
            EventClass::Unknown => {
                tracing::debug!("Ignoring unrecognized hub event '{}'", frame.target);
            }
        }
    }

    fn push_system_message(&mut self, body: &str) {
        let message = Message {
            id: None,
            body: body.to_string(),
            sender_name: "system".to_string(),
            sender_id: None,
            timestamp: self.clock.now_utc_millis(),
            room_key: self.room.id(),
            kind: MessageKind::System,
        };
        self.buffer.append(message.clone());
        self.emit(ClientEvent::Message(message));
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }

    fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state() != state {
            tracing::debug!("{} connection state -> {}", self.profile.name(), state);
        }
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: ClientEvent) {
        // Send errors just mean nobody is subscribed right now.
        let _ = self.events_tx.send(event);
    }
}
