//! Owner of the application's single realtime connection.

use std::sync::{Arc, Mutex, MutexGuard};

use iterbene_shared::RealtimeError;

use super::connection::Connection;
use super::options::RealtimeOptions;
use super::transport::{parse_endpoint, Connector, NetworkConnector};

/// Holds at most one live [`Connection`] between `initialize` and `dispose`.
///
/// The application creates one of these at its root and hands it to
/// consumers; there is no module-level global.
pub struct RealtimeClient {
    connector: Arc<dyn Connector>,
    slot: Mutex<Option<Connection>>,
}

impl RealtimeClient {
    pub fn new() -> Self {
        Self::with_connector(Arc::new(NetworkConnector::new()))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            slot: Mutex::new(None),
        }
    }

    /// Open the connection, or return the existing one.
    ///
    /// Must be called from within a tokio runtime. Repeat calls never open a
    /// second connection; differing arguments are logged and ignored.
    pub fn initialize(
        &self,
        endpoint: &str,
        options: RealtimeOptions,
    ) -> Result<Connection, RealtimeError> {
        let mut slot = self.lock();

        if let Some(existing) = slot.as_ref() {
            let same_endpoint = parse_endpoint(endpoint)
                .map(|url| &url == existing.endpoint())
                .unwrap_or(false);
            if !same_endpoint || existing.options() != &options {
                crate::log_warn!(
                    "Realtime already initialized for {}; ignoring new endpoint/options",
                    existing.endpoint()
                );
            }
            return Ok(existing.clone());
        }

        let url = parse_endpoint(endpoint)?;
        options.validate()?;

        crate::log_info!(
            "Initializing realtime connection to {} (transports: {:?})",
            url,
            options.transports
        );
        let connection = Connection::open(url, options, self.connector.clone());
        *slot = Some(connection.clone());
        Ok(connection)
    }

    /// The current handle, if initialized.
    pub fn get_connection(&self) -> Option<Connection> {
        self.lock().clone()
    }

    /// Close and release the connection. A no-op when not initialized.
    pub fn dispose(&self) {
        let taken = self.lock().take();
        if let Some(connection) = taken {
            crate::log_info!("Disposing realtime connection to {}", connection.endpoint());
            connection.close();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RealtimeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RealtimeClient {
    fn drop(&mut self) {
        self.dispose();
    }
}
