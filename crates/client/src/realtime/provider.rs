//! Dioxus provider that owns the realtime client for a UI subtree.

use std::sync::Arc;

use dioxus::prelude::*;

use super::client::RealtimeClient;
use super::connection::Connection;
use super::options::RealtimeOptions;
use super::state::ConnectionState;

/// Context published by [`RealtimeProvider`].
#[derive(Clone)]
pub struct RealtimeContext {
    /// `None` when the endpoint or options were rejected.
    pub connection: Option<Connection>,
    /// Mirrors the connection state reactively.
    pub state: Signal<ConnectionState>,
}

/// Opens the realtime connection on first render, shares it with every
/// descendant and disposes it when the subtree unmounts.
///
/// Mount it once, at the root of the app. A provider nested below another
/// one does not open a second connection: it logs a warning and hands the
/// outer provider's context down unchanged.
///
/// ```rust,ignore
/// rsx! {
///     RealtimeProvider { endpoint: config.socket_url.clone(), options: config.realtime.clone(),
///         Router::<Route> {}
///     }
/// }
/// ```
#[component]
pub fn RealtimeProvider(endpoint: String, options: RealtimeOptions, children: Element) -> Element {
    let outer = try_use_context::<RealtimeContext>();
    let client = use_hook(|| Arc::new(RealtimeClient::new()));

    let connection = use_hook({
        let client = client.clone();
        let outer = outer.clone();
        move || {
            if let Some(outer) = outer {
                crate::log_warn!("RealtimeProvider nested in another; sharing the outer connection");
                return outer.connection;
            }
            match client.initialize(&endpoint, options) {
                Ok(connection) => Some(connection),
                Err(e) => {
                    crate::log_error!("Realtime connection not started: {}", e);
                    None
                }
            }
        }
    });

    let mut state = use_signal({
        let connection = connection.clone();
        move || {
            connection
                .as_ref()
                .map(Connection::state)
                .unwrap_or(ConnectionState::Disconnected)
        }
    });

    // Mirror transitions into the signal for as long as the subtree lives
    use_hook({
        let connection = connection.clone();
        let nested = outer.is_some();
        move || {
            if nested {
                return;
            }
            if let Some(connection) = connection {
                let mut rx = connection.watch_state();
                spawn(async move {
                    while rx.changed().await.is_ok() {
                        let next = *rx.borrow_and_update();
                        state.set(next);
                    }
                });
            }
        }
    });

    use_drop(move || client.dispose());

    use_context_provider(|| outer.unwrap_or(RealtimeContext { connection, state }));

    children
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::realtime::use_realtime;

    static SEEN: Mutex<Vec<Option<String>>> = Mutex::new(Vec::new());

    fn options() -> RealtimeOptions {
        RealtimeOptions {
            reconnection: false,
            ..Default::default()
        }
    }

    #[component]
    fn RecordConnection() -> Element {
        let id = use_realtime().map(|conn| conn.id().to_string());
        SEEN.lock().unwrap().push(id);
        rsx! {}
    }

    fn nested_app() -> Element {
        rsx! {
            RealtimeProvider { endpoint: "ws://127.0.0.1:9/socket".to_string(), options: options(),
                RecordConnection {}
                RealtimeProvider { endpoint: "ws://127.0.0.1:9/other".to_string(), options: options(),
                    RecordConnection {}
                }
            }
        }
    }

    #[tokio::test]
    async fn nested_provider_shares_the_outer_connection() {
        let mut dom = VirtualDom::new(nested_app);
        dom.rebuild_in_place();

        let seen = SEEN.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_some());
        assert_eq!(seen[0], seen[1]);
    }
}
