//! Realtime session client.
//!
//! One [`RealtimeClient`] owns at most one live [`Connection`] to the
//! messaging endpoint. The connection keeps itself alive according to
//! [`RealtimeOptions`] and reports progress through [`ConnectionState`];
//! application code observes the state but never drives it.
//!
//! # Architecture
//!
//! ```text
//! RealtimeProvider (Dioxus component, owns the client)
//!        │ context
//!        ▼
//! RealtimeClient ── initialize / get_connection / dispose
//!        │
//!        ▼
//! Connection (handle) ◀──watch/broadcast── Driver (tokio task)
//!                                             │ Connector
//!                                  ┌──────────┴──────────┐
//!                                  ▼                     ▼
//!                          WebSocketSession       PollingSession
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = RealtimeClient::new();
//! let conn = client.initialize("wss://api.iterbene.com/socket", RealtimeOptions::default())?;
//! let mut events = conn.subscribe();
//! conn.emit("join", serde_json::json!({ "chatId": "c1" }))?;
//! client.dispose();
//! ```

mod client;
mod connection;
mod hooks;
mod options;
mod provider;
mod state;
pub mod transport;

pub use client::RealtimeClient;
pub use connection::Connection;
pub use hooks::{use_connection_state, use_realtime, use_realtime_events};
pub use options::{
    RealtimeOptions, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_RECONNECTION_ATTEMPTS, DEFAULT_RECONNECTION_DELAY, DEFAULT_RECONNECTION_DELAY_MAX,
};
pub use provider::{RealtimeContext, RealtimeProvider};
pub use state::ConnectionState;
pub use transport::{Connector, NetworkConnector, TransportSession};
