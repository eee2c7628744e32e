//! Request-polling transport.
//!
//! `GET {base}/poll` opens a session and returns its `sid`. A background task
//! then long-polls `GET {base}/poll?sid=..` and forwards each batch into a
//! channel so `recv` stays cancel-safe. Sends are `POST`s of a one-element
//! array; `DELETE` closes the session.

use std::time::Duration;

use async_trait::async_trait;
use iterbene_shared::{Envelope, PollHandshake, RealtimeError, TransportKind};
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

use super::TransportSession;

const INCOMING_CAPACITY: usize = 64;
/// Pause after an empty batch so a server that answers immediately is not
/// hammered.
const EMPTY_POLL_PAUSE: Duration = Duration::from_millis(250);

pub struct PollingSession {
    http: reqwest::Client,
    url: Url,
    sid: String,
    incoming: mpsc::Receiver<Envelope>,
    poller: JoinHandle<()>,
}

impl PollingSession {
    pub async fn connect(http: reqwest::Client, endpoint: &Url) -> Result<Self, RealtimeError> {
        let url = poll_url(endpoint);
        let resp = http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| RealtimeError::transport(TransportKind::Polling, e))?;
        if !resp.status().is_success() {
            return Err(RealtimeError::transport(
                TransportKind::Polling,
                format!("handshake returned HTTP {}", resp.status().as_u16()),
            ));
        }
        let handshake: PollHandshake = resp
            .json()
            .await
            .map_err(|e| RealtimeError::transport(TransportKind::Polling, e))?;

        crate::log_info!("Polling session {} opened at {}", handshake.sid, url);

        let (tx, incoming) = mpsc::channel(INCOMING_CAPACITY);
        let poller = tokio::spawn(poll_loop(
            http.clone(),
            url.clone(),
            handshake.sid.clone(),
            tx,
        ));

        Ok(Self {
            http,
            url,
            sid: handshake.sid,
            incoming,
            poller,
        })
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }
}

async fn poll_loop(http: reqwest::Client, url: Url, sid: String, tx: mpsc::Sender<Envelope>) {
    loop {
        let resp = match http.get(url.clone()).query(&[("sid", &sid)]).send().await {
            Ok(resp) => resp,
            Err(e) => {
                crate::log_error!("Poll request failed for {}: {}", sid, e);
                return;
            }
        };

        let status = resp.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            crate::log_info!("Polling session {} ended by server", sid);
            return;
        }
        if !status.is_success() {
            crate::log_warn!("Poll for {} returned HTTP {}", sid, status.as_u16());
            return;
        }

        let batch = match resp.json::<Vec<Envelope>>().await {
            Ok(batch) => batch,
            Err(e) => {
                crate::log_error!("Undecodable poll batch for {}: {}", sid, e);
                return;
            }
        };

        if batch.is_empty() {
            tokio::time::sleep(EMPTY_POLL_PAUSE).await;
            continue;
        }

        for envelope in batch {
            if tx.send(envelope).await.is_err() {
                // Session dropped
                return;
            }
        }
    }
}

#[async_trait]
impl TransportSession for PollingSession {
    fn kind(&self) -> TransportKind {
        TransportKind::Polling
    }

    async fn send(&mut self, envelope: &Envelope) -> Result<(), RealtimeError> {
        let resp = self
            .http
            .post(self.url.clone())
            .query(&[("sid", &self.sid)])
            .json(&[envelope])
            .send()
            .await
            .map_err(|e| RealtimeError::transport(TransportKind::Polling, e))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(RealtimeError::transport(
                TransportKind::Polling,
                format!("send returned HTTP {}", resp.status().as_u16()),
            ))
        }
    }

    async fn recv(&mut self) -> Option<Envelope> {
        self.incoming.recv().await
    }

    async fn close(&mut self) {
        self.poller.abort();
        let result = self
            .http
            .delete(self.url.clone())
            .query(&[("sid", &self.sid)])
            .send()
            .await;
        if let Err(e) = result {
            crate::log_debug!("Polling close for {}: {}", self.sid, e);
        }
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

fn poll_url(endpoint: &Url) -> Url {
    let mut url = endpoint.clone();
    let path = format!("{}/poll", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    url
}
