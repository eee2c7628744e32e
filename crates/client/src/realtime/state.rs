use std::fmt;

/// Lifecycle state of a realtime connection.
///
/// Transitions are driven by the connection loop; application code only
/// observes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Disconnected,
    ReconnectExhausted,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }

    /// No further transitions will happen without a new `initialize`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::ReconnectExhausted)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting { .. } => "Reconnecting",
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::ReconnectExhausted => "Offline",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Reconnecting { attempt } => write!(f, "reconnecting (attempt {})", attempt),
            other => f.write_str(&other.label().to_ascii_lowercase()),
        }
    }
}
