//! Hooks for components below a [`RealtimeProvider`](super::RealtimeProvider).
//!
//! Outside a provider they degrade to "no connection" rather than panicking.

use dioxus::prelude::*;
use iterbene_shared::Envelope;
use tokio::sync::broadcast::error::RecvError;

use super::connection::Connection;
use super::provider::RealtimeContext;
use super::state::ConnectionState;

/// The shared connection handle, if one is open.
pub fn use_realtime() -> Option<Connection> {
    try_use_context::<RealtimeContext>().and_then(|ctx| ctx.connection)
}

/// The current connection state (reactive).
pub fn use_connection_state() -> ConnectionState {
    try_use_context::<RealtimeContext>()
        .map(|ctx| *ctx.state.read())
        .unwrap_or(ConnectionState::Disconnected)
}

/// The most recent `limit` incoming envelopes, oldest first.
pub fn use_realtime_events(limit: usize) -> Signal<Vec<Envelope>> {
    let connection = use_realtime();
    let mut events = use_signal(Vec::<Envelope>::new);

    use_hook(move || {
        let Some(connection) = connection else {
            return;
        };
        let mut rx = connection.subscribe();
        spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(envelope) => {
                        let mut list = events.write();
                        list.push(envelope);
                        if list.len() > limit {
                            let excess = list.len() - limit;
                            list.drain(..excess);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        crate::log_warn!("Event feed lagged, skipped {} envelopes", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    });

    events
}
