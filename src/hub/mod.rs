//! Hub transport — publish/subscribe against the clipboard hub.
//!
//! Outbound: `POST {url}/set` with a JSON `SyncEvent` body, best-effort
//! (failures are logged and swallowed, last write wins). Inbound:
//! `GET {url}/events` as a server-sent event stream; events named
//! `texts` carry a base64-encoded JSON `SyncEvent` (the hub encodes SSE
//! data so multi-line clipboard text survives the line-oriented
//! framing).
//!
//! The client does not resubscribe: a terminated event stream is
//! surfaced to the coordinator, which treats it as fatal.

pub mod sse;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sse::{SseDecoder, SseFrame};

/// Name of the SSE event stream carrying clipboard payloads.
const TEXTS_EVENT: &str = "texts";

/// The unit exchanged with the hub in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub text: String,
    pub device: String,
}

/// Hub transport errors.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("subscribe failed: hub returned {0}")]
    SubscribeStatus(reqwest::StatusCode),
}

/// HTTP client for one hub.
#[derive(Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base: String,
}

impl HubClient {
    /// # Errors
    ///
    /// Fails only if the underlying TLS/HTTP client can't be built.
    pub fn new(base_url: &str) -> Result<Self, HubError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("clipsyncd/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Publish one event. Best-effort: all failures are swallowed.
    pub async fn publish(&self, evt: &SyncEvent) {
        match self
            .http
            .post(format!("{}/set", self.base))
            .json(evt)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(bytes = evt.text.len(), "published to hub");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "hub rejected publish");
            }
            Err(e) => {
                tracing::warn!(error = %e, "hub publish failed");
            }
        }
    }

    /// Open the hub's event stream.
    ///
    /// # Errors
    ///
    /// Fails if the subscription request can't be made or the hub
    /// answers with a non-success status.
    pub async fn events(&self) -> Result<EventStream, HubError> {
        let resp = self
            .http
            .get(format!("{}/events", self.base))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(HubError::SubscribeStatus(resp.status()));
        }

        tracing::info!(url = %format!("{}/events", self.base), "subscribed to hub");
        Ok(EventStream {
            body: Box::pin(resp.bytes_stream()),
            decoder: SseDecoder::new(),
            pending: Vec::new(),
        })
    }
}

/// Lazy sequence of [`SyncEvent`]s from an open subscription.
pub struct EventStream {
    body: futures::stream::BoxStream<'static, Result<bytes::Bytes, reqwest::Error>>,
    decoder: SseDecoder,
    pending: Vec<SyncEvent>,
}

impl EventStream {
    /// Next event, or `None` when the hub closed the stream.
    ///
    /// Malformed frames (bad base64, bad JSON, wrong event name) are
    /// skipped with a warning rather than terminating the stream.
    ///
    /// # Errors
    ///
    /// Transport errors mid-stream propagate; the coordinator treats
    /// them like stream termination.
    pub async fn next_event(&mut self) -> Result<Option<SyncEvent>, HubError> {
        loop {
            if !self.pending.is_empty() {
                return Ok(Some(self.pending.remove(0)));
            }

            let Some(chunk) = self.body.next().await else {
                return Ok(None);
            };
            let chunk = chunk?;

            self.pending = self
                .decoder
                .feed(&chunk)
                .into_iter()
                .filter_map(decode_frame)
                .collect();
        }
    }
}

/// Decode one SSE frame into a [`SyncEvent`].
///
/// Frames with other event names (keep-alives, future additions) and
/// undecodable payloads yield `None`.
fn decode_frame(frame: SseFrame) -> Option<SyncEvent> {
    if frame.event != TEXTS_EVENT {
        return None;
    }
    let raw = match BASE64.decode(frame.data.as_bytes()) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "dropping event with undecodable base64 data");
            return None;
        }
    };
    match serde_json::from_slice(&raw) {
        Ok(evt) => Some(evt),
        Err(e) => {
            tracing::warn!(error = %e, "dropping event with malformed payload");
            None
        }
    }
}

/// Drain the publish channel into the hub, one event at a time.
///
/// Keeps the send pipeline fire-and-forget: it enqueues and moves on
/// while this task does the networking. Ends when the channel closes.
pub fn spawn_publisher(
    client: HubClient,
    mut publish_rx: mpsc::UnboundedReceiver<SyncEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(evt) = publish_rx.recv().await {
            client.publish(&evt).await;
        }
    })
}
