//! Application event handling.
//!
//! This module processes background fetch completions and live-stream
//! events, folding each into the feed.

use crate::app::{App, AppEvent, LiveStatus};
use murmur::api::LiveEvent;
use murmur::reconciler::{Arrival, LoadOutcome};
use tokio::sync::mpsc;

use super::helpers::{spawn_load, spawn_resync};

/// Handle application events from background tasks.
pub(super) fn handle_app_event(
    app: &mut App,
    event: AppEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        AppEvent::PageLoaded { request, result } => {
            let outcome = app.finish_load(request, result);
            tracing::debug!(?outcome, "Page load finished");

            // A short page may leave the sentinel still in view; keep going
            // until it scrolls out or the list runs out.
            if matches!(outcome, LoadOutcome::Loaded { added, .. } if added > 0)
                && app.feed.sentinel_visible()
            {
                spawn_load(app, event_tx);
            }
        }
        AppEvent::ResyncLoaded { result } => {
            app.resync_handle = None;
            match result {
                Ok(page) => {
                    let pending = app.apply_resync(page);
                    if pending > 0 {
                        tracing::info!(pending, "Resync queued missed arrivals");
                    }
                    app.sync_scroll();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Resync failed");
                    app.set_status(format!("Resync failed: {}", e));
                }
            }
        }
    }
}

/// Handle one event from the live subscription.
pub(super) fn handle_live_event(
    app: &mut App,
    event: LiveEvent,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match event {
        LiveEvent::Connected => {
            tracing::info!("Live stream connected");
            app.live = LiveStatus::Live;
        }
        LiveEvent::Item(entry) => {
            let id = entry.id().to_string();
            match app.feed.enqueue(entry) {
                Arrival::Merged { index } => {
                    tracing::debug!(id = %id, index, "Live update merged into row");
                }
                Arrival::Queued { pending } => {
                    tracing::debug!(id = %id, pending, "Live arrival queued");
                }
                Arrival::Requeued | Arrival::Discarded => {}
            }
        }
        LiveEvent::Disconnected { error, retry_in } => {
            tracing::warn!(error = %error, retry_in_ms = retry_in.as_millis() as u64, "Live stream lost");
            app.live = LiveStatus::Reconnecting { retry_in };
            app.set_status(format!(
                "Live updates interrupted, retrying in {}s",
                retry_in.as_secs().max(1)
            ));
        }
        LiveEvent::Reconnected => {
            tracing::info!("Live stream reconnected, resyncing");
            app.live = LiveStatus::Live;
            spawn_resync(app, event_tx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::TaskError;
    use murmur::api::{ApiClient, Entry, Post, Resource};
    use murmur::config::Config;
    use murmur::reconciler::Page;
    use std::time::Duration;

    fn post(id: &str) -> Entry {
        Entry::Post(Post {
            id: id.to_string(),
            content: String::new(),
            user: None,
            nsfw: false,
            spoiler_of: None,
            reactions_count: 0,
            comments_count: 0,
            created_at: chrono::Utc::now(),
        })
    }

    fn app() -> App {
        let client = ApiClient::new("http://localhost:3000", None).unwrap();
        let page = Page::new(vec![post("p2"), post("p1")], None, Some("p1".into()));
        let config = Config {
            page_size: 2,
            ..Config::default()
        };
        App::new(&client, Resource::Timeline, page, &config).unwrap()
    }

    #[tokio::test]
    async fn test_live_items_queue_behind_affordance() {
        let mut app = app();
        let (tx, _rx) = mpsc::channel(4);
        handle_live_event(&mut app, LiveEvent::Connected, &tx);
        handle_live_event(&mut app, LiveEvent::Item(post("p3")), &tx);
        assert_eq!(app.live, LiveStatus::Live);
        assert_eq!(app.feed.pending(), 1);
        assert_eq!(app.feed.len(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_sets_status() {
        let mut app = app();
        let (tx, _rx) = mpsc::channel(4);
        handle_live_event(
            &mut app,
            LiveEvent::Disconnected {
                error: "reset".into(),
                retry_in: Duration::from_secs(6),
            },
            &tx,
        );
        assert_eq!(
            app.live,
            LiveStatus::Reconnecting {
                retry_in: Duration::from_secs(6)
            }
        );
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.contains("6s"));
    }

    #[tokio::test]
    async fn test_failed_resync_reports_status() {
        let mut app = app();
        let (tx, _rx) = mpsc::channel(4);
        handle_app_event(
            &mut app,
            AppEvent::ResyncLoaded {
                result: Err(TaskError::Panicked("boom".into())),
            },
            &tx,
        );
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.starts_with("Resync failed"));
    }

    #[tokio::test]
    async fn test_page_loaded_appends() {
        let mut app = app();
        let (tx, _rx) = mpsc::channel(4);
        let request = app.feed.begin_load().unwrap();
        handle_app_event(
            &mut app,
            AppEvent::PageLoaded {
                request,
                result: Ok(Page::new(vec![post("p0")], None, None)),
            },
            &tx,
        );
        assert_eq!(app.feed.len(), 3);
        assert!(app.feed.no_more());
        assert!(app.load_handle.is_none());
    }
}
