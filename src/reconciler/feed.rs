//! The feed reconciler.
//!
//! A `Feed` owns an ordered, key-unique list of rendered rows plus the
//! bookkeeping needed to grow it from two directions:
//!
//! - **Older items** come from a paginated source through the load-more
//!   trigger. Only one load may be in flight; a short page latches `no_more`
//!   and removes the trigger for good.
//! - **Newer items** arrive out of band (`enqueue`). Arrivals for rows already
//!   on screen update that row in place; everything else waits in a queue
//!   behind an "N new items" affordance until the user asks for it (`flush`).
//!
//! All methods take `&mut self` and never await while holding list state, so
//! a load completion and a flush cannot interleave their mutations when
//! driven from a single event loop.

use super::focus::{Nav, RovingFocus};
use super::queue::{default_pluralize, Pending};
use super::state::{ListState, Row};
use super::types::{
    Arrival, FeedError, Initial, Keyed, Layout, LoadOutcome, LoadRequest, Page, PageSource,
    Release, Trigger, TriggerMode,
};

/// Rows from the older end at which an armed sentinel counts as visible.
pub const DEFAULT_SENTINEL_DISTANCE: usize = 3;

type RenderFn<T, R> = Box<dyn Fn(&T) -> R>;
type ErrorFn = Box<dyn Fn(&dyn std::error::Error)>;
type PluralizeFn = Box<dyn Fn(usize) -> String>;

fn log_load_error(err: &dyn std::error::Error) {
    tracing::warn!(error = %err, "Failed to load more items");
}

// ============================================================================
// Options
// ============================================================================

/// Construction options for [`Feed::render`].
///
/// `render_item` is required; everything else has a default.
pub struct FeedOptions<T, R> {
    render_item: Option<RenderFn<T, R>>,
    page_size: usize,
    layout: Layout,
    trigger: TriggerMode,
    on_error: ErrorFn,
    pluralize: PluralizeFn,
    empty_state: Option<R>,
    sentinel_distance: usize,
}

impl<T, R> FeedOptions<T, R> {
    pub fn new(page_size: usize) -> Self {
        Self {
            render_item: None,
            page_size,
            layout: Layout::default(),
            trigger: TriggerMode::default(),
            on_error: Box::new(log_load_error),
            pluralize: Box::new(default_pluralize),
            empty_state: None,
            sentinel_distance: DEFAULT_SENTINEL_DISTANCE,
        }
    }

    pub fn render_item(mut self, f: impl Fn(&T) -> R + 'static) -> Self {
        self.render_item = Some(Box::new(f));
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn trigger(mut self, mode: TriggerMode) -> Self {
        self.trigger = mode;
        self
    }

    pub fn on_error(mut self, f: impl Fn(&dyn std::error::Error) + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    pub fn pluralize(mut self, f: impl Fn(usize) -> String + 'static) -> Self {
        self.pluralize = Box::new(f);
        self
    }

    pub fn empty_state(mut self, placeholder: R) -> Self {
        self.empty_state = Some(placeholder);
        self
    }

    pub fn sentinel_distance(mut self, rows: usize) -> Self {
        self.sentinel_distance = rows;
        self
    }
}

// ============================================================================
// Feed
// ============================================================================

enum Placed {
    Inserted,
    Merged,
}

pub struct Feed<T: Keyed, R> {
    state: ListState<T, R>,
    render_item: RenderFn<T, R>,
    on_error: ErrorFn,
    pluralize: PluralizeFn,
    page_size: usize,
    layout: Layout,
    sentinel_distance: usize,
    /// Seeded from a bare item list: no cursor bookkeeping.
    cursorless: bool,
    placeholder: Option<R>,
    trigger: Trigger,
    focus: RovingFocus,
    generation: u64,
    attachments: Vec<Box<dyn Release>>,
    torn_down: bool,
}

impl<T: Keyed, R> Feed<T, R> {
    /// Build a feed from its first page and render every item in order.
    ///
    /// An empty first page shows the placeholder (if any). A first page with
    /// fewer than `page_size` items, or a page that reports no older cursor,
    /// means the whole list is already here and no trigger is created.
    pub fn render(
        initial: impl Into<Initial<T>>,
        options: FeedOptions<T, R>,
    ) -> Result<Self, FeedError> {
        let render_item = options.render_item.ok_or(FeedError::MissingRenderer)?;
        if options.page_size == 0 {
            return Err(FeedError::InvalidPageSize(0));
        }

        let (items, cursor, cursorless) = match initial.into() {
            Initial::Page(page) => {
                let cursor = page.older_cursor(options.layout).map(str::to_owned);
                (page.items, cursor, false)
            }
            Initial::Items(items) => (items, None, true),
        };

        let mut feed = Self {
            state: ListState::new(),
            render_item,
            on_error: options.on_error,
            pluralize: options.pluralize,
            page_size: options.page_size,
            layout: options.layout,
            sentinel_distance: options.sentinel_distance,
            cursorless,
            placeholder: None,
            trigger: Trigger::Armed(options.trigger),
            focus: RovingFocus::new(),
            generation: 0,
            attachments: Vec::new(),
            torn_down: false,
        };

        let received = items.len();
        for item in items {
            let at = feed.state.len();
            feed.place(at, item);
        }
        feed.state.cursor = cursor;

        if feed.state.is_empty() {
            feed.placeholder = options.empty_state;
        }
        if feed.is_exhausted(received) {
            feed.exhaust();
        }

        tracing::debug!(
            items = feed.state.len(),
            page_size = feed.page_size,
            layout = ?feed.layout,
            no_more = feed.state.no_more(),
            "Feed rendered"
        );
        Ok(feed)
    }

    fn is_exhausted(&self, received: usize) -> bool {
        received < self.page_size || (!self.cursorless && self.state.cursor.is_none())
    }

    fn exhaust(&mut self) {
        self.state.mark_no_more();
        self.trigger = Trigger::Removed;
    }

    /// Insert a row at `at`, or refresh the existing row with the same key.
    fn place(&mut self, at: usize, item: T) -> Placed {
        let node = (self.render_item)(&item);
        match self.state.position(&item.key()) {
            Some(index) => {
                self.state.update(index, Row { item, node });
                Placed::Merged
            }
            None => {
                self.state.insert(at, Row { item, node });
                Placed::Inserted
            }
        }
    }

    // ------------------------------------------------------------------------
    // Load more
    // ------------------------------------------------------------------------

    /// The trigger fired. Returns the fetch to perform, or `None` when a load
    /// is already in flight, the list is exhausted, or the feed is gone.
    pub fn begin_load(&mut self) -> Option<LoadRequest> {
        if self.torn_down || self.state.loading || self.state.no_more() {
            tracing::trace!(
                loading = self.state.loading,
                no_more = self.state.no_more(),
                "Load-more trigger ignored"
            );
            return None;
        }
        if !matches!(self.trigger, Trigger::Armed(_)) {
            return None;
        }

        self.state.loading = true;
        self.generation = self.generation.wrapping_add(1);
        let request = LoadRequest {
            cursor: self.state.cursor.clone(),
            count: self.page_size,
            generation: self.generation,
        };
        tracing::debug!(cursor = ?request.cursor, count = request.count, "Loading more items");
        Some(request)
    }

    /// Apply the result of a fetch started by [`Feed::begin_load`].
    pub fn finish_load<E: std::error::Error>(
        &mut self,
        request: LoadRequest,
        result: Result<Page<T>, E>,
    ) -> LoadOutcome {
        if self.torn_down || !self.state.loading || request.generation != self.generation {
            tracing::debug!(
                torn_down = self.torn_down,
                generation = request.generation,
                "Discarding late load-more result"
            );
            return LoadOutcome::Discarded;
        }
        self.state.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                (self.on_error)(&err);
                return LoadOutcome::Failed;
            }
        };

        let received = page.items.len();
        let next_cursor = page.older_cursor(self.layout).map(str::to_owned);
        let len_before = self.state.len();

        let mut added = 0;
        let mut merged = 0;
        for item in page.items {
            // A queued live snapshot is newer than the page's copy.
            let item = self.state.queue.remove(&item.key()).unwrap_or(item);
            let at = match self.layout {
                Layout::Forward => self.state.len(),
                // Older items go above the current head, keeping the page's own order.
                Layout::Reverse => added,
            };
            match self.place(at, item) {
                Placed::Inserted => added += 1,
                Placed::Merged => merged += 1,
            }
        }

        let inserted_at = match self.layout {
            Layout::Forward => len_before,
            Layout::Reverse => 0,
        };
        self.focus.on_inserted(inserted_at, added, len_before);
        if added > 0 {
            self.placeholder = None;
        }

        self.state.cursor = next_cursor;
        let no_more = self.is_exhausted(received);
        if no_more {
            self.exhaust();
        }

        tracing::debug!(added, merged, no_more, cursor = ?self.state.cursor, "Loaded more items");
        LoadOutcome::Loaded {
            added,
            merged,
            no_more,
        }
    }

    /// Fire the trigger and await `source` directly.
    pub async fn load_more<S: PageSource<T>>(&mut self, source: &S) -> LoadOutcome {
        let Some(request) = self.begin_load() else {
            return LoadOutcome::Skipped;
        };
        let result = source
            .fetch_page(request.cursor.as_deref(), request.count)
            .await;
        self.finish_load(request, result)
    }

    // ------------------------------------------------------------------------
    // Live arrivals
    // ------------------------------------------------------------------------

    /// Accept a live arrival without disturbing the rendered rows.
    pub fn enqueue(&mut self, item: T) -> Arrival {
        if self.torn_down {
            return Arrival::Discarded;
        }

        if let Some(index) = self.state.position(&item.key()) {
            let node = (self.render_item)(&item);
            self.state.update(index, Row { item, node });
            return Arrival::Merged { index };
        }

        match self.state.queue.push(item) {
            Pending::Added(pending) => Arrival::Queued { pending },
            Pending::Replaced => Arrival::Requeued,
        }
    }

    /// Merge every queued arrival into the rendered rows.
    ///
    /// Arrivals are inserted oldest first, so in forward layout the most
    /// recent one ends up on top. Returns the number of rows added.
    pub fn flush(&mut self) -> usize {
        if self.torn_down || self.state.queue.is_empty() {
            return 0;
        }

        let arrivals: Vec<T> = self.state.queue.drain_oldest_first().collect();
        let len_before = self.state.len();
        let mut added = 0;
        for item in arrivals {
            let at = match self.layout {
                Layout::Forward => 0,
                Layout::Reverse => self.state.len(),
            };
            if let Placed::Inserted = self.place(at, item) {
                added += 1;
            }
        }

        let inserted_at = match self.layout {
            Layout::Forward => 0,
            Layout::Reverse => len_before,
        };
        self.focus.on_inserted(inserted_at, added, len_before);
        self.placeholder = None;

        tracing::debug!(added, total = self.state.len(), "Flushed live arrivals");
        added
    }

    // ------------------------------------------------------------------------
    // Removal and focus
    // ------------------------------------------------------------------------

    /// Drop a rendered item. Unknown keys are ignored.
    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let (index, row) = self.state.remove(key)?;
        self.focus.on_removed(index);
        Some(row.item)
    }

    pub fn navigate(&mut self, nav: Nav) -> Option<usize> {
        if self.torn_down {
            return None;
        }
        self.focus.navigate(nav, self.state.len())
    }

    /// True when an armed sentinel is within reach of the focused row.
    pub fn sentinel_visible(&self) -> bool {
        if self.state.loading || self.trigger != Trigger::Armed(TriggerMode::Sentinel) {
            return false;
        }
        let len = self.state.len();
        let Some(index) = self.focus.current(len) else {
            return false;
        };
        let distance = match self.layout {
            Layout::Forward => len - 1 - index,
            Layout::Reverse => index,
        };
        distance <= self.sentinel_distance
    }

    // ------------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------------

    /// Hand a resource to the feed; it is released on teardown.
    pub fn attach(&mut self, mut resource: impl Release + 'static) {
        if self.torn_down {
            resource.release();
            return;
        }
        self.attachments.push(Box::new(resource));
    }

    /// Release the trigger, attached resources and every row. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        for mut resource in self.attachments.drain(..) {
            resource.release();
        }
        self.trigger = Trigger::Removed;
        self.state.clear();
        self.placeholder = None;
        self.focus.reset();
        tracing::debug!("Feed torn down");
    }

    // ------------------------------------------------------------------------
    // Container view
    // ------------------------------------------------------------------------

    pub fn rows(&self) -> impl Iterator<Item = &R> {
        self.state.rows().iter().map(|row| &row.node)
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.state.rows().iter().map(|row| &row.item)
    }

    pub fn item(&self, index: usize) -> Option<&T> {
        self.state.rows().get(index).map(|row| &row.item)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.state.contains(key)
    }

    pub fn placeholder(&self) -> Option<&R> {
        self.placeholder.as_ref()
    }

    /// Label for the "N new items" affordance, `None` while hidden.
    pub fn affordance(&self) -> Option<String> {
        match self.state.queue.len() {
            0 => None,
            n => Some((self.pluralize)(n)),
        }
    }

    pub fn pending(&self) -> usize {
        self.state.queue.len()
    }

    pub fn queued(&self) -> impl Iterator<Item = &T> {
        self.state.queue.iter()
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    pub fn focused(&self) -> Option<usize> {
        if self.torn_down {
            return None;
        }
        self.focus.current(self.state.len())
    }

    pub fn focused_item(&self) -> Option<&T> {
        self.focused().and_then(|index| self.item(index))
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn no_more(&self) -> bool {
        self.state.no_more()
    }

    pub fn cursor(&self) -> Option<&str> {
        self.state.cursor.as_deref()
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl<T: Keyed, R> Drop for Feed<T, R> {
    fn drop(&mut self) {
        self.teardown();
    }
}
