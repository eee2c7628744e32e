//! Transports carrying a realtime session.
//!
//! The connection loop never talks to sockets directly. It asks a
//! [`Connector`] for a [`TransportSession`] of a given kind, in the order the
//! options prefer, and drives whichever one opens first.

mod polling;
mod websocket;

use async_trait::async_trait;
use iterbene_shared::{Envelope, RealtimeError, TransportKind};
use url::Url;

pub use polling::PollingSession;
pub use websocket::WebSocketSession;

/// An open session over one transport.
#[async_trait]
pub trait TransportSession: Send {
    fn kind(&self) -> TransportKind;

    async fn send(&mut self, envelope: &Envelope) -> Result<(), RealtimeError>;

    /// Next incoming envelope, or `None` once the session has ended.
    ///
    /// Must be cancel-safe: the connection loop races it against outgoing
    /// sends and shutdown.
    async fn recv(&mut self) -> Option<Envelope>;

    /// Close the session. Errors are ignored.
    async fn close(&mut self);
}

/// Opens transport sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        kind: TransportKind,
        endpoint: &Url,
    ) -> Result<Box<dyn TransportSession>, RealtimeError>;
}

/// Connector backed by real network transports.
#[derive(Clone, Default)]
pub struct NetworkConnector {
    http: reqwest::Client,
}

impl NetworkConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    async fn connect(
        &self,
        kind: TransportKind,
        endpoint: &Url,
    ) -> Result<Box<dyn TransportSession>, RealtimeError> {
        let url = endpoint_for(kind, endpoint);
        crate::log_debug!("Opening {} transport to {}", kind, url);
        match kind {
            TransportKind::WebSocket => Ok(Box::new(WebSocketSession::connect(&url).await?)),
            TransportKind::Polling => Ok(Box::new(
                PollingSession::connect(self.http.clone(), &url).await?,
            )),
        }
    }
}

/// Parse and check a realtime endpoint. Accepts ws, wss, http and https.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, RealtimeError> {
    let url = Url::parse(endpoint.trim()).map_err(|e| RealtimeError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "ws" | "wss" | "http" | "https" => Ok(url),
        other => Err(RealtimeError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Rewrite the endpoint scheme for a transport: ws/wss for the stream,
/// http/https for polling. TLS-ness is preserved.
pub fn endpoint_for(kind: TransportKind, endpoint: &Url) -> Url {
    let secure = matches!(endpoint.scheme(), "wss" | "https");
    let scheme = match (kind, secure) {
        (TransportKind::WebSocket, true) => "wss",
        (TransportKind::WebSocket, false) => "ws",
        (TransportKind::Polling, true) => "https",
        (TransportKind::Polling, false) => "http",
    };
    let mut url = endpoint.clone();
    // Switching between special schemes always succeeds.
    let _ = url.set_scheme(scheme);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_scheme_follows_transport() {
        let url = parse_endpoint("https://api.iterbene.com/socket").unwrap();
        assert_eq!(
            endpoint_for(TransportKind::WebSocket, &url).as_str(),
            "wss://api.iterbene.com/socket"
        );
        assert_eq!(
            endpoint_for(TransportKind::Polling, &url).as_str(),
            "https://api.iterbene.com/socket"
        );

        let url = parse_endpoint("ws://localhost:8000/socket").unwrap();
        assert_eq!(
            endpoint_for(TransportKind::Polling, &url).as_str(),
            "http://localhost:8000/socket"
        );
    }

    #[test]
    fn rejects_non_network_schemes() {
        assert!(matches!(
            parse_endpoint("ftp://example.com"),
            Err(RealtimeError::InvalidEndpoint { .. })
        ));
        assert!(parse_endpoint("not a url").is_err());
    }
}
