//! Helper functions for UI operations.
//!
//! Background fetches are spawned from here; their results come back to the
//! event loop as [`AppEvent`]s.

use crate::app::{App, AppEvent, TaskError};
use futures::FutureExt;
use murmur::api::PageQuery;
use murmur::reconciler::PageSource;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// A panicking fetch must still report back, otherwise the feed would stay
/// in its loading state forever.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Fire the load-more trigger and fetch the next older page in the background.
///
/// Returns false when the feed declined (already loading, exhausted, or torn
/// down).
pub(crate) fn spawn_load(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) -> bool {
    let Some(request) = app.feed.begin_load() else {
        return false;
    };

    let source = app.source.clone();
    let tx = event_tx.clone();
    let cursor = request.cursor.clone();
    let count = request.count;

    app.needs_redraw = true;
    app.load_handle = Some(tokio::spawn(async move {
        let result = match catch_task_panic(source.fetch_page(cursor.as_deref(), count)).await {
            Ok(result) => result.map_err(TaskError::from),
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Load-more task panicked");
                Err(TaskError::Panicked(panic_msg))
            }
        };

        if let Err(e) = tx.send(AppEvent::PageLoaded { request, result }).await {
            tracing::warn!(error = %e, "Failed to send page (receiver dropped)");
        }
    }));
    true
}

/// Fetch the newest page so arrivals missed while disconnected get queued.
pub(super) fn spawn_resync(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(handle) = app.resync_handle.take() {
        handle.abort();
        tracing::debug!("Aborted previous resync task");
    }

    let client = app.source.client().clone();
    let resource = app.resource.clone();
    let count = app.page_size();
    let tx = event_tx.clone();

    tracing::debug!(resource = ?resource, "Spawning resync task");

    app.resync_handle = Some(tokio::spawn(async move {
        let fetch = client.fetch_page(&resource, PageQuery::older(None, count));
        let result = match catch_task_panic(fetch).await {
            Ok(result) => result.map_err(TaskError::from),
            Err(panic_msg) => {
                tracing::error!(error = %panic_msg, "Resync task panicked");
                Err(TaskError::Panicked(panic_msg))
            }
        };

        if let Err(e) = tx.send(AppEvent::ResyncLoaded { result }).await {
            tracing::warn!(error = %e, "Failed to send resync page (receiver dropped)");
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catch_task_panic_passes_value_through() {
        assert_eq!(catch_task_panic(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_catch_task_panic_reports_message() {
        let result = catch_task_panic(async {
            if true {
                panic!("boom");
            }
        })
        .await;
        assert_eq!(result, Err("boom".to_string()));
    }
}
