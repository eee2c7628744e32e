//! Realtime wire types shared by every transport.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The mechanism carrying a realtime session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Persistent bidirectional stream.
    WebSocket,
    /// Repeated long-poll requests.
    Polling,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::WebSocket => "websocket",
            TransportKind::Polling => "polling",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(TransportKind::WebSocket),
            "polling" => Ok(TransportKind::Polling),
            other => Err(format!("unknown transport '{}'", other)),
        }
    }
}

/// A single realtime event. The payload is opaque to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(default = "new_envelope_id")]
    pub id: String,
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
    /// Receive time when the sender leaves it out.
    #[serde(default = "Utc::now")]
    pub ts: DateTime<Utc>,
}

fn new_envelope_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: new_envelope_id(),
            event: event.into(),
            data,
            ts: Utc::now(),
        }
    }
}

/// Polling handshake response: `GET {base}/poll`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollHandshake {
    pub sid: String,
}
