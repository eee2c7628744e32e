//! Iter Bene client core.
//!
//! The realtime session client and the small pieces of client state around
//! it: a single-flight loader for the map provider script, an encrypted
//! credential store, display formatters, and the Dioxus provider and
//! components that share the connection with the UI.

pub mod logging;

pub mod components;
pub mod config;
pub mod credentials;
pub mod format;
pub mod loader;
pub mod realtime;
pub mod storage;

pub use config::AppConfig;
pub use credentials::CredentialStore;
pub use loader::{LoadStatus, MapsScriptLoader, SingleFlight};
pub use realtime::{Connection, ConnectionState, RealtimeClient, RealtimeOptions, RealtimeProvider};
pub use storage::Storage;
