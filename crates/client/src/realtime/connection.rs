//! Connection handle and the background loop that keeps it alive.

use std::fmt;
use std::sync::Arc;

use iterbene_shared::{Envelope, RealtimeError};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use url::Url;

use super::options::RealtimeOptions;
use super::state::ConnectionState;
use super::transport::{Connector, TransportSession};

/// Incoming envelopes buffered per subscriber before it starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Shared handle to one live realtime connection.
///
/// Clones refer to the same connection. Equality is identity.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    id: String,
    endpoint: Url,
    options: RealtimeOptions,
    state: watch::Receiver<ConnectionState>,
    outgoing: mpsc::UnboundedSender<Envelope>,
    events: broadcast::Sender<Envelope>,
    shutdown: watch::Sender<bool>,
}

impl Connection {
    /// Spawn the connection loop on the current tokio runtime.
    pub(crate) fn open(
        endpoint: Url,
        options: RealtimeOptions,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = Driver {
            endpoint: endpoint.clone(),
            options: options.clone(),
            connector,
            state: state_tx,
            outgoing: outgoing_rx,
            events: events_tx.clone(),
        };
        tokio::spawn(driver.run(shutdown_rx));

        Self {
            inner: Arc::new(Inner {
                id: uuid::Uuid::new_v4().to_string(),
                endpoint,
                options,
                state: state_rx,
                outgoing: outgoing_tx,
                events: events_tx,
                shutdown: shutdown_tx,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    pub fn options(&self) -> &RealtimeOptions {
        &self.inner.options
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.clone()
    }

    /// Wait until the state satisfies `pred` and return it.
    pub async fn wait_for_state(
        &self,
        pred: impl FnMut(&ConnectionState) -> bool,
    ) -> ConnectionState {
        let mut rx = self.watch_state();
        let state = match rx.wait_for(pred).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        };
        state
    }

    /// Subscribe to incoming envelopes from the point of subscription on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.inner.events.subscribe()
    }

    /// Send an event. Fails with `NotConnected` unless the session is up;
    /// nothing is queued for a later session.
    pub fn emit(&self, event: &str, data: impl Serialize) -> Result<(), RealtimeError> {
        if !self.is_connected() {
            return Err(RealtimeError::NotConnected);
        }
        let data = serde_json::to_value(data).map_err(|e| RealtimeError::Encode(e.to_string()))?;
        self.inner
            .outgoing
            .send(Envelope::new(event, data))
            .map_err(|_| RealtimeError::Closed)
    }

    /// Stop the connection loop. Pending sends are not drained.
    pub fn close(&self) {
        self.inner.shutdown.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.shutdown.borrow()
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("state", &self.state())
            .finish()
    }
}

enum SessionEnd {
    Shutdown,
    Lost,
}

/// Owns the transport side of a connection.
struct Driver {
    endpoint: Url,
    options: RealtimeOptions,
    connector: Arc<dyn Connector>,
    state: watch::Sender<ConnectionState>,
    outgoing: mpsc::UnboundedReceiver<Envelope>,
    events: broadcast::Sender<Envelope>,
}

impl Driver {
    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut attempt = 0u32;

        loop {
            if attempt == 0 {
                self.set_state(ConnectionState::Connecting);
            } else {
                self.set_state(ConnectionState::Reconnecting { attempt });
            }

            let opened = tokio::select! {
                session = self.open_session() => session,
                _ = shutdown_requested(&mut shutdown) => {
                    self.set_state(ConnectionState::Disconnected);
                    return;
                }
            };

            match opened {
                Some(mut session) => {
                    attempt = 0;
                    self.set_state(ConnectionState::Connected);

                    let end = self.pump(session.as_mut(), &mut shutdown).await;
                    // emit() refuses from here on, so nothing new is queued
                    self.set_state(ConnectionState::Disconnected);
                    let kind = session.kind();
                    if tokio::time::timeout(self.options.timeout, session.close())
                        .await
                        .is_err()
                    {
                        crate::log_warn!("Closing {} session to {} timed out", kind, self.endpoint);
                    }
                    self.drop_unsent();

                    if matches!(end, SessionEnd::Shutdown) {
                        return;
                    }
                    if !self.options.reconnection {
                        crate::log_info!("Reconnection disabled, staying disconnected from {}", self.endpoint);
                        return;
                    }
                }
                None => {
                    if !self.options.should_retry(attempt) {
                        crate::log_warn!(
                            "Giving up on {} after {} reconnect attempts",
                            self.endpoint,
                            attempt
                        );
                        self.set_state(ConnectionState::ReconnectExhausted);
                        return;
                    }
                }
            }

            let delay = self.options.delay_for_attempt(attempt);
            crate::log_info!(
                "Reconnecting to {} in {}ms (attempt {})",
                self.endpoint,
                delay.as_millis(),
                attempt + 1
            );
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_requested(&mut shutdown) => {
                    self.set_state(ConnectionState::Disconnected);
                    return;
                }
            }
            attempt += 1;
        }
    }

    /// Try each transport in preference order; the first to open wins.
    async fn open_session(&self) -> Option<Box<dyn TransportSession>> {
        for &kind in &self.options.transports {
            let connect = self.connector.connect(kind, &self.endpoint);
            match tokio::time::timeout(self.options.timeout, connect).await {
                Ok(Ok(session)) => {
                    crate::log_info!("Connected to {} over {}", self.endpoint, kind);
                    return Some(session);
                }
                Ok(Err(e)) => crate::log_warn!("{}", e),
                Err(_) => crate::log_warn!("{}", RealtimeError::Timeout { kind }),
            }
        }
        None
    }

    async fn pump(
        &mut self,
        session: &mut dyn TransportSession,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SessionEnd {
        loop {
            tokio::select! {
                _ = shutdown_requested(shutdown) => return SessionEnd::Shutdown,
                outgoing = self.outgoing.recv() => match outgoing {
                    Some(envelope) => {
                        if let Err(e) = session.send(&envelope).await {
                            crate::log_error!("Send over {} failed: {}", session.kind(), e);
                            return SessionEnd::Lost;
                        }
                    }
                    None => return SessionEnd::Shutdown,
                },
                incoming = session.recv() => match incoming {
                    Some(envelope) => {
                        crate::log_debug!("Received '{}' from {}", envelope.event, self.endpoint);
                        // No subscribers is fine
                        let _ = self.events.send(envelope);
                    }
                    None => {
                        crate::log_info!("{} session to {} closed", session.kind(), self.endpoint);
                        return SessionEnd::Lost;
                    }
                },
            }
        }
    }

    /// Sends queued for a session that is gone are the caller's to retry.
    fn drop_unsent(&mut self) {
        let mut dropped = 0usize;
        while self.outgoing.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            crate::log_warn!("Dropped {} unsent envelopes for {}", dropped, self.endpoint);
        }
    }

    fn set_state(&self, next: ConnectionState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            crate::log_info!("Realtime {}: {} -> {}", self.endpoint, prev, next);
        }
    }
}

/// Resolves once shutdown is requested or every handle is gone.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
