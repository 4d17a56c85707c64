//! Realtime document feed
//!
//! Subscribes to the backend's SSE record feed and forwards document
//! change events. The subscription is the only part of the client that
//! retries automatically: after any error the stream is reopened on a
//! fixed delay until cancelled.

use std::time::Duration;

use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::chat::sse::SseFrameBuffer;
use crate::error::Result;
use crate::workspace::record::DocumentRecord;

/// Realtime feed endpoint path
const REALTIME_PATH: &str = "/api/realtime";

/// A change event on the document collection
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEvent {
    /// What happened: `create`, `update` or `delete`
    pub action: String,
    /// The affected record
    pub record: DocumentRecord,
}

/// Retrying SSE subscription to the document feed
pub struct RealtimeSubscription {
    api: ApiClient,
    retry_delay: Duration,
    cancel: CancellationToken,
}

impl RealtimeSubscription {
    /// Creates a subscription with a fixed reconnect delay
    pub fn new(api: ApiClient, retry_delay: Duration) -> Self {
        Self {
            api,
            retry_delay,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the subscription loop when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the subscription until cancelled
    ///
    /// Each stream error is logged and followed by a reconnect after the
    /// fixed delay. Events are forwarded in arrival order.
    pub async fn run(&self, events: mpsc::UnboundedSender<RecordEvent>) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.stream_once(&events).await {
                Ok(()) => {
                    tracing::debug!("Realtime stream closed, reconnecting");
                }
                Err(e) => {
                    tracing::warn!("Realtime stream failed: {}", e);
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }

    /// Opens the feed once and forwards events until it ends
    async fn stream_once(&self, events: &mpsc::UnboundedSender<RecordEvent>) -> Result<()> {
        let response = self.api.get_stream(REALTIME_PATH).await?;
        let mut stream = response.bytes_stream();
        let mut frames = SseFrameBuffer::new();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                chunk = stream.next() => {
                    match chunk {
                        Some(Ok(bytes)) => {
                            for payload in frames.push_chunk(&bytes) {
                                forward_event(&payload, events);
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => break,
                    }
                }
            }
        }

        for payload in frames.flush() {
            forward_event(&payload, events);
        }
        Ok(())
    }
}

/// Parses one feed payload and forwards it
///
/// Non-record payloads (connection handshakes, keepalives) and parse
/// failures are skipped.
fn forward_event(payload: &str, events: &mpsc::UnboundedSender<RecordEvent>) {
    match serde_json::from_str::<RecordEvent>(payload) {
        Ok(event) => {
            let _ = events.send(event);
        }
        Err(e) => {
            tracing::debug!("Skipping non-record realtime payload: {}", e);
        }
    }
}
