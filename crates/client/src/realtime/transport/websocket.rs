//! Persistent-stream transport using tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use iterbene_shared::{Envelope, RealtimeError, TransportKind};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use url::Url;

use super::TransportSession;

pub struct WebSocketSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketSession {
    pub async fn connect(url: &Url) -> Result<Self, RealtimeError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| RealtimeError::transport(TransportKind::WebSocket, e))?;
        crate::log_info!("WebSocket connected to {}", url);
        Ok(Self { stream })
    }
}

#[async_trait]
impl TransportSession for WebSocketSession {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    async fn send(&mut self, envelope: &Envelope) -> Result<(), RealtimeError> {
        let json =
            serde_json::to_string(envelope).map_err(|e| RealtimeError::Encode(e.to_string()))?;
        self.stream
            .send(Message::text(json))
            .await
            .map_err(|e| RealtimeError::transport(TransportKind::WebSocket, e))
    }

    async fn recv(&mut self) -> Option<Envelope> {
        while let Some(msg) = self.stream.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<Envelope>(text.as_str()) {
                    Ok(envelope) => return Some(envelope),
                    Err(e) => crate::log_warn!("Dropping undecodable frame: {}", e),
                },
                Ok(Message::Close(frame)) => {
                    crate::log_info!("WebSocket received close frame: {:?}", frame);
                    return None;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Pong is handled automatically by tungstenite
                }
                Ok(_) => {
                    // Binary and raw frames carry nothing for us
                }
                Err(e) => {
                    crate::log_error!("WebSocket read error: {}", e);
                    return None;
                }
            }
        }
        None
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            crate::log_debug!("WebSocket close: {}", e);
        }
    }
}
