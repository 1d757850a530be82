use crate::ui::rows::render_entry;
use anyhow::Result;
use murmur::api::{ApiClient, Entry, FetchError, Resource, ResourceSource};
use murmur::config::Config;
use murmur::keybindings::KeybindingRegistry;
use murmur::reconciler::{
    Feed, FeedOptions, Initial, Keyed, Layout, LoadOutcome, LoadRequest, Nav, Page,
};
use ratatui::text::Line;
use ratatui::widgets::ListState as ScrollState;
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// The list on screen: API entries rendered to terminal lines.
pub type FeedView = Feed<Entry, Line<'static>>;

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

// ============================================================================
// Background Events
// ============================================================================

/// Why a background fetch produced no page.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("task panicked: {0}")]
    Panicked(String),
}

/// Results delivered from spawned tasks back to the event loop.
pub enum AppEvent {
    /// A load-more fetch finished. Carries the request it was issued for so
    /// stale completions can be recognized.
    PageLoaded {
        request: LoadRequest,
        result: Result<Page<Entry>, TaskError>,
    },
    /// The newest page, fetched to catch up after a reconnect or on demand.
    ResyncLoaded { result: Result<Page<Entry>, TaskError> },
}

/// State of the live subscription, for the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveStatus {
    /// No stream for this resource, or disabled in config.
    Off,
    Connecting,
    Live,
    Reconnecting { retry_in: Duration },
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub resource: Resource,
    pub source: ResourceSource,
    pub feed: FeedView,
    pub keybindings: KeybindingRegistry,
    pub live: LiveStatus,

    /// Scroll position of the rendered list, kept in step with feed focus.
    pub scroll: ScrollState,

    /// Last load-more failure, filled by the feed's error handler.
    load_error: Rc<RefCell<Option<String>>>,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub show_help: bool,
    pub help_scroll_offset: usize,
    pub needs_redraw: bool,
    pub spinner_frame: usize,

    /// In-flight fetches, aborted on teardown.
    pub load_handle: Option<JoinHandle<()>>,
    pub resync_handle: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(
        client: &ApiClient,
        resource: Resource,
        initial: impl Into<Initial<Entry>>,
        config: &Config,
    ) -> Result<Self> {
        let load_error = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&load_error);
        let (singular, plural) = resource.noun();

        let options = FeedOptions::new(config.page_size)
            .render_item(render_entry)
            .layout(resource.layout())
            .trigger(config.load_trigger)
            .on_error(move |err| {
                tracing::warn!(error = %err, "Failed to load more items");
                *slot.borrow_mut() = Some(err.to_string());
            })
            .pluralize(move |n| {
                format!("{} new {}", n, if n == 1 { singular } else { plural })
            })
            .empty_state(Line::from(resource.empty_text()));

        let feed = Feed::render(initial, options)?;

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!(warning = %warning, "Keybinding override ignored");
        }

        let mut app = Self {
            source: client.source(resource.clone()),
            resource,
            feed,
            keybindings,
            live: LiveStatus::Off,
            scroll: ScrollState::default(),
            load_error,
            status_message: None,
            show_help: false,
            help_scroll_offset: 0,
            needs_redraw: true,
            spinner_frame: 0,
            load_handle: None,
            resync_handle: None,
        };
        app.sync_scroll();
        Ok(app)
    }

    /// Point the list widget at the focused row.
    pub fn sync_scroll(&mut self) {
        self.scroll.select(self.feed.focused());
    }

    pub fn navigate(&mut self, nav: Nav) {
        self.feed.navigate(nav);
        self.sync_scroll();
    }

    /// Drop the focused row from the list. Returns its id.
    pub fn remove_focused(&mut self) -> Option<String> {
        let key = self.feed.focused_item()?.key();
        self.feed.remove(&key)?;
        self.sync_scroll();
        Some(key)
    }

    /// Apply a load-more completion and surface any error.
    pub fn finish_load(
        &mut self,
        request: LoadRequest,
        result: Result<Page<Entry>, TaskError>,
    ) -> LoadOutcome {
        self.load_handle = None;
        let outcome = self.feed.finish_load(request, result);
        let error = self.load_error.borrow_mut().take();
        if let Some(error) = error {
            self.set_status(format!("Load failed: {} (retry with [m])", error));
        }
        self.sync_scroll();
        outcome
    }

    /// Queue every item of a freshly fetched newest page.
    ///
    /// Items are enqueued oldest first so the queue's most-recent-first order
    /// matches the server's. Rendered items merge in place. Returns the
    /// number of items now waiting behind the affordance.
    pub fn apply_resync(&mut self, page: Page<Entry>) -> usize {
        let items: Vec<Entry> = match self.feed.layout() {
            Layout::Forward => page.items.into_iter().rev().collect(),
            Layout::Reverse => page.items,
        };
        for item in items {
            self.feed.enqueue(item);
        }
        self.feed.pending()
    }

    pub fn page_size(&self) -> usize {
        self.feed.page_size()
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if one was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() >= STATUS_TTL {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Release the feed and abort outstanding fetches.
    pub fn teardown(&mut self) {
        for handle in [self.load_handle.take(), self.resync_handle.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
        self.feed.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur::api::Post;
    use murmur::reconciler::{Arrival, Trigger};
    use pretty_assertions::assert_eq;
    use tokio::time;

    fn post(id: &str, minute: u32) -> Entry {
        Entry::Post(Post {
            id: id.to_string(),
            content: format!("post {}", id),
            user: None,
            nsfw: false,
            spoiler_of: None,
            reactions_count: 0,
            comments_count: 0,
            created_at: chrono::DateTime::parse_from_rfc3339(&format!(
                "2024-05-01T10:{:02}:00Z",
                minute
            ))
            .unwrap()
            .into(),
        })
    }

    fn ids(app: &App) -> Vec<String> {
        app.feed.items().map(|e| e.id().to_string()).collect()
    }

    fn test_app(resource: Resource, page: Page<Entry>, config: Config) -> App {
        let client = ApiClient::new("http://localhost:3000", None).unwrap();
        App::new(&client, resource, page, &config).unwrap()
    }

    fn timeline_app() -> App {
        let page = Page::new(
            vec![post("p3", 3), post("p2", 2)],
            Some("p3".into()),
            Some("p2".into()),
        );
        test_app(
            Resource::Timeline,
            page,
            Config {
                page_size: 2,
                ..Config::default()
            },
        )
    }

    #[test]
    fn test_affordance_uses_resource_noun() {
        let mut app = timeline_app();
        app.feed.enqueue(post("p4", 4));
        assert_eq!(app.feed.affordance().as_deref(), Some("1 new post"));
        app.feed.enqueue(post("p5", 5));
        assert_eq!(app.feed.affordance().as_deref(), Some("2 new posts"));
    }

    #[test]
    fn test_resync_queues_newest_first() {
        let mut app = timeline_app();
        let page = Page::new(
            vec![post("p5", 5), post("p4", 4), post("p3", 3)],
            Some("p5".into()),
            Some("p3".into()),
        );
        assert_eq!(app.apply_resync(page), 2);
        app.feed.flush();
        assert_eq!(ids(&app), vec!["p5", "p4", "p3", "p2"]);
    }

    #[test]
    fn test_resync_reverse_layout_appends_in_order() {
        let comment = |id: &str| {
            murmur::api::EntryKind::Comment
                .decode(
                    format!(r#"{{"id":"{}","createdAt":"2024-05-01T10:00:00Z"}}"#, id).as_bytes(),
                )
                .unwrap()
        };
        let mut app = test_app(
            Resource::Comments {
                post_id: "p1".into(),
            },
            Page::new(vec![comment("c1"), comment("c2")], None, Some("c2".into())),
            Config::default(),
        );
        app.apply_resync(Page::new(
            vec![comment("c2"), comment("c3"), comment("c4")],
            None,
            None,
        ));
        app.feed.flush();
        assert_eq!(ids(&app), vec!["c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn test_load_error_becomes_status() {
        let mut app = timeline_app();
        let request = app.feed.begin_load().unwrap();
        let outcome = app.finish_load(request, Err(TaskError::Panicked("boom".into())));
        assert_eq!(outcome, LoadOutcome::Failed);
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.contains("boom"));
        assert!(matches!(app.feed.trigger(), Trigger::Armed(_)));
    }

    #[test]
    fn test_remove_focused_keeps_focus_in_bounds() {
        let mut app = timeline_app();
        app.navigate(Nav::Last);
        assert_eq!(app.remove_focused().as_deref(), Some("p2"));
        assert_eq!(app.scroll.selected(), Some(0));
        assert_eq!(app.remove_focused().as_deref(), Some("p3"));
        assert_eq!(app.remove_focused(), None);
    }

    #[test]
    fn test_empty_first_page_shows_placeholder() {
        let app = test_app(
            Resource::Notifications,
            Page::new(Vec::new(), None, None),
            Config::default(),
        );
        assert!(app.feed.placeholder().is_some());
        assert_eq!(app.feed.trigger(), Trigger::Removed);
    }

    #[test]
    fn test_live_merge_does_not_queue() {
        let mut app = timeline_app();
        assert_eq!(
            app.feed.enqueue(post("p2", 9)),
            Arrival::Merged { index: 1 }
        );
        assert_eq!(app.feed.affordance(), None);
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        let mut app = timeline_app();
        time::pause();
        app.set_status("Test message");
        assert!(!app.clear_expired_status());
        time::advance(Duration::from_secs(3)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_teardown_aborts_fetches() {
        let mut app = timeline_app();
        app.load_handle = Some(tokio::spawn(std::future::pending::<()>()));
        app.teardown();
        assert!(app.load_handle.is_none());
        assert!(app.feed.is_torn_down());
    }
}
