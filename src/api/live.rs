//! Live arrivals over Server-Sent Events.
//!
//! `subscribe` spawns one task per resource. The task keeps a stream open,
//! decodes each event into an [`Entry`] and forwards it on a channel; the
//! event loop hands those to `Feed::enqueue`. Dropped connections are retried
//! with exponential backoff, and a successful reconnect is reported so the
//! caller can resync whatever it missed.

use super::client::{ApiClient, FetchError};
use super::models::Entry;
use super::resource::Resource;
use super::sse::SseDecoder;
use crate::reconciler::Release;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delay before the first reconnect attempt.
pub const INITIAL_RETRY: Duration = Duration::from_secs(3);
/// Reconnect delay ceiling.
pub const MAX_RETRY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// First connection established.
    Connected,
    Item(Entry),
    /// Connection lost; another attempt follows after `retry_in`.
    Disconnected { error: String, retry_in: Duration },
    /// Connection re-established after a drop. Arrivals may have been missed.
    Reconnected,
}

/// Reconnect delays: `initial`, doubling up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: INITIAL_RETRY,
            max: MAX_RETRY,
        }
    }
}

/// Handle to a running subscription. Aborts the task when released or dropped.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Release for Subscription {
    fn release(&mut self) {
        self.handle.abort();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start streaming `resource`. Returns `None` for resources without a stream.
///
/// The task ends on its own once `tx`'s receiver is dropped.
pub fn subscribe(
    client: &ApiClient,
    resource: &Resource,
    backoff: Backoff,
    tx: mpsc::Sender<LiveEvent>,
) -> Option<Subscription> {
    if !resource.is_live() {
        return None;
    }

    let client = client.clone();
    let resource = resource.clone();
    tracing::debug!(resource = ?resource, "Starting live subscription");

    let handle = tokio::spawn(async move {
        run(client, resource, backoff, tx).await;
    });
    Some(Subscription { handle })
}

enum StreamEnd {
    Closed,
    Failed(FetchError),
    ReceiverDropped,
}

async fn run(client: ApiClient, resource: Resource, backoff: Backoff, tx: mpsc::Sender<LiveEvent>) {
    let mut decoder = SseDecoder::new();
    let mut connected_before = false;
    let mut base = backoff.initial;
    let mut delay = base;

    loop {
        let end = stream_once(
            &client,
            &resource,
            &mut decoder,
            &tx,
            &mut connected_before,
            &mut base,
            &mut delay,
        )
        .await;

        let error = match end {
            StreamEnd::ReceiverDropped => {
                tracing::debug!("Live receiver dropped, stopping subscription");
                return;
            }
            StreamEnd::Closed => "stream closed by server".to_string(),
            StreamEnd::Failed(e) => e.to_string(),
        };

        tracing::warn!(
            error = %error,
            retry_ms = delay.as_millis() as u64,
            "Live stream disconnected"
        );
        let notice = LiveEvent::Disconnected {
            error,
            retry_in: delay,
        };
        if tx.send(notice).await.is_err() {
            return;
        }

        tokio::time::sleep(delay).await;
        delay = (delay * 2).min(backoff.max);
    }
}

async fn stream_once(
    client: &ApiClient,
    resource: &Resource,
    decoder: &mut SseDecoder,
    tx: &mpsc::Sender<LiveEvent>,
    connected_before: &mut bool,
    base: &mut Duration,
    delay: &mut Duration,
) -> StreamEnd {
    let last_id = decoder.last_event_id().map(str::to_owned);
    let response = match client.open_stream(resource, last_id.as_deref()).await {
        Ok(response) => response,
        Err(e) => return StreamEnd::Failed(e),
    };

    decoder.reset();

    let status = if *connected_before {
        LiveEvent::Reconnected
    } else {
        LiveEvent::Connected
    };
    *connected_before = true;
    *delay = *base;
    tracing::info!(reconnect = matches!(status, LiveEvent::Reconnected), "Live stream connected");
    if tx.send(status).await.is_err() {
        return StreamEnd::ReceiverDropped;
    }

    let kind = resource.kind();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => return StreamEnd::Failed(FetchError::Network(e)),
        };

        let events = decoder.push(&chunk);
        if let Some(ms) = decoder.retry() {
            let requested = Duration::from_millis(ms);
            if requested != *base {
                tracing::debug!(retry_ms = ms, "Server set reconnect delay");
                *base = requested;
                *delay = requested;
            }
        }
        for event in events {
            match kind.decode(event.data.as_bytes()) {
                Ok(entry) => {
                    tracing::trace!(id = entry.id(), "Live arrival");
                    if tx.send(LiveEvent::Item(entry)).await.is_err() {
                        return StreamEnd::ReceiverDropped;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        event = %event.event,
                        "Skipping undecodable live event"
                    );
                }
            }
        }
    }
    StreamEnd::Closed
}
