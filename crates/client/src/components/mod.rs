//! Components built on the realtime context.

pub mod connection_badge;
pub mod event_feed;

pub use connection_badge::*;
pub use event_feed::*;
