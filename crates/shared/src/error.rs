//! Error types for the client layer.
//!
//! Callers rarely see these as hard failures. The realtime loop absorbs
//! transport errors into connection state, and credential errors collapse to
//! "absent". They exist so each layer can log and branch on a typed reason.

use thiserror::Error;

use crate::protocol::TransportKind;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RealtimeError {
    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid realtime options: {0}")]
    InvalidOptions(String),

    #[error("{kind} transport failed: {reason}")]
    Transport { kind: TransportKind, reason: String },

    #[error("{kind} connect timed out")]
    Timeout { kind: TransportKind },

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    Closed,

    #[error("failed to encode envelope: {0}")]
    Encode(String),
}

impl RealtimeError {
    pub fn transport(kind: TransportKind, reason: impl ToString) -> Self {
        RealtimeError::Transport {
            kind,
            reason: reason.to_string(),
        }
    }
}

/// Errors from the lazy resource loader.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("map provider API key is not configured")]
    MissingApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}")]
    Http { status: u16 },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("storage write failed for '{0}'")]
    Storage(String),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed")]
    Decrypt,

    #[error("malformed stored value: {0}")]
    Malformed(String),
}
