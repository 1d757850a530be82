use serde::Deserialize;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Construction errors. These indicate a caller bug, not a runtime condition,
/// so `Feed::render` refuses to build rather than limping along.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Feed options are missing a render_item function")]
    MissingRenderer,

    #[error("Page size must be at least 1 (got {0})")]
    InvalidPageSize(usize),
}

// ============================================================================
// Items and Pages
// ============================================================================

/// An item with a stable identity.
///
/// The reconciler never looks at anything else on the item; all other fields
/// are passed through to the render function untouched.
pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug;

    fn key(&self) -> Self::Key;
}

/// One page of a cursor-paginated listing.
///
/// Wire shape: `{"items": [...], "startCursor": "..", "endCursor": ".."}`.
/// A `None` cursor means nothing further exists in that direction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub start_cursor: Option<String>,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, start_cursor: Option<String>, end_cursor: Option<String>) -> Self {
        Self {
            items,
            start_cursor,
            end_cursor,
        }
    }

    /// The cursor pointing at older items for the given layout.
    pub fn older_cursor(&self, layout: Layout) -> Option<&str> {
        match layout {
            Layout::Forward => self.end_cursor.as_deref(),
            Layout::Reverse => self.start_cursor.as_deref(),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            start_cursor: self.start_cursor,
            end_cursor: self.end_cursor,
        }
    }
}

/// What a feed is seeded with.
///
/// Bare item lists come from callers that have no cursor information; their
/// pagination relies purely on the page-size rule and the source is asked for
/// the next page with no cursor.
#[derive(Debug, Clone)]
pub enum Initial<T> {
    Page(Page<T>),
    Items(Vec<T>),
}

impl<T> From<Page<T>> for Initial<T> {
    fn from(page: Page<T>) -> Self {
        Initial::Page(page)
    }
}

impl<T> From<Vec<T>> for Initial<T> {
    fn from(items: Vec<T>) -> Self {
        Initial::Items(items)
    }
}

// ============================================================================
// Layout and Trigger
// ============================================================================

/// Where older and newer items go.
///
/// - `Forward`: newest at the top. Older pages are fetched with the end cursor
///   and appended; live arrivals are flushed onto the head.
/// - `Reverse`: oldest at the top (comment threads). Older pages are fetched
///   with the start cursor and prepended; live arrivals are flushed onto the tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Forward,
    Reverse,
}

/// How the "load more" trigger is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Explicit row the user activates.
    Button,
    /// Fires automatically when focus gets close to the older end.
    #[default]
    #[serde(alias = "auto")]
    Sentinel,
}

/// Current state of the pagination trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Armed(TriggerMode),
    /// Permanently gone: the list ran out or the feed was torn down.
    Removed,
}

// ============================================================================
// Collaborators
// ============================================================================

/// A paginated source of items, e.g. one HTTP endpoint.
pub trait PageSource<T> {
    type Error: std::error::Error;

    /// Fetch up to `count` items older than `cursor`.
    fn fetch_page(
        &self,
        cursor: Option<&str>,
        count: usize,
    ) -> impl Future<Output = Result<Page<T>, Self::Error>> + Send;
}

/// A resource owned by a feed that must be released on teardown
/// (live subscriptions, watchers).
pub trait Release {
    fn release(&mut self);
}

impl Release for tokio::task::JoinHandle<()> {
    fn release(&mut self) {
        self.abort();
    }
}

// ============================================================================
// Operation results
// ============================================================================

/// Issued by `Feed::begin_load`; must be handed back to `Feed::finish_load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub cursor: Option<String>,
    pub count: usize,
    pub(crate) generation: u64,
}

/// Result of completing a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Items were added (`added`) or merged into existing rows (`merged`).
    Loaded {
        added: usize,
        merged: usize,
        no_more: bool,
    },
    /// The fetch failed; the trigger stays armed for retry.
    Failed,
    /// Nothing was fetched: a load is in flight or the list is exhausted.
    Skipped,
    /// The feed was torn down or the request is stale.
    Discarded,
}

/// Result of `Feed::enqueue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// The item was already rendered; its row was updated in place.
    Merged { index: usize },
    /// New item buffered; `pending` is the queue length afterwards.
    Queued { pending: usize },
    /// The item was already waiting in the queue; its snapshot was replaced.
    Requeued,
    /// The feed was torn down.
    Discarded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserializes_camel_case_cursors() {
        let page: Page<u32> =
            serde_json::from_str(r#"{"items":[1,2],"startCursor":"a","endCursor":"b"}"#).unwrap();
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.start_cursor.as_deref(), Some("a"));
        assert_eq!(page.end_cursor.as_deref(), Some("b"));
    }

    #[test]
    fn test_page_missing_fields_default() {
        let page: Page<u32> = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        assert!(page.items.is_empty());
        assert!(page.start_cursor.is_none());
        assert!(page.end_cursor.is_none());

        let page: Page<u32> = serde_json::from_str(r#"{"endCursor":null}"#).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_older_cursor_follows_layout() {
        let page = Page::new(vec![1u8], Some("start".into()), Some("end".into()));
        assert_eq!(page.older_cursor(Layout::Forward), Some("end"));
        assert_eq!(page.older_cursor(Layout::Reverse), Some("start"));
    }

    #[test]
    fn test_trigger_mode_accepts_auto_alias() {
        #[derive(Deserialize)]
        struct Wrap {
            mode: TriggerMode,
        }
        let w: Wrap = toml::from_str("mode = \"auto\"").unwrap();
        assert_eq!(w.mode, TriggerMode::Sentinel);
        let w: Wrap = toml::from_str("mode = \"button\"").unwrap();
        assert_eq!(w.mode, TriggerMode::Button);
    }
}
