//! Real-time room messaging client for the Stationhub platform.
//!
//! The platform exposes several WebSocket hubs (train chat, public chat,
//! delivery chat, notifications) that all follow the same shape: connect
//! with an access token, join a logical room, exchange JSON-framed
//! messages, and recover from disconnects. This crate implements that
//! shape once as [`HubClient`], parameterized by a [`HubProfile`] per hub.

pub mod auth;
pub mod client;
pub mod error;
pub mod formatter;
pub mod message;
pub mod profile;
pub mod protocol;
pub mod reconnect;
pub mod state;
pub mod transport;

mod buffer;
mod worker;

pub use auth::{StaticTokenProvider, TokenProvider};
pub use client::{ClientEvent, HubClient, HubClientBuilder};
pub use error::ClientError;
pub use message::{Message, MessageKind, RoomKey};
pub use profile::HubProfile;
pub use reconnect::ReconnectPolicy;
pub use state::ConnectionState;
