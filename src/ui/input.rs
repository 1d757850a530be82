//! Input handling for the TUI.
//!
//! Keys are resolved through the keybinding registry and dispatched to the
//! feed operations they name.

use crate::app::{App, AppEvent};
use crossterm::event::{KeyCode, KeyModifiers};
use murmur::keybindings::{Action as KbAction, Context as KbContext};
use murmur::reconciler::{Nav, Trigger};
use tokio::sync::mpsc;

use super::helpers::{spawn_load, spawn_resync};
use super::Action;

/// Main input dispatch function.
pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    // Help overlay captures all keys when visible
    if app.show_help {
        return handle_help_input(app, code, modifiers);
    }

    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Global)
    else {
        return Action::Continue;
    };

    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::Next => navigate(app, Nav::Next, event_tx),
        KbAction::Prev => navigate(app, Nav::Prev, event_tx),
        KbAction::First => navigate(app, Nav::First, event_tx),
        KbAction::Last => navigate(app, Nav::Last, event_tx),
        KbAction::Flush => {
            let shown = app.feed.flush();
            if shown > 0 {
                app.sync_scroll();
                app.set_status(format!(
                    "Showing {} new {}",
                    shown,
                    noun(app, shown)
                ));
            }
        }
        KbAction::LoadMore => match app.feed.trigger() {
            Trigger::Removed => app.set_status("Nothing more to load"),
            Trigger::Armed(_) => {
                if !spawn_load(app, event_tx) {
                    tracing::debug!("Load more ignored, already loading");
                }
            }
        },
        KbAction::Remove => {
            if let Some(id) = app.remove_focused() {
                tracing::info!(id = %id, "Removed item from list");
                app.set_status("Removed from list");
            }
        }
        KbAction::Resync => {
            app.set_status("Checking for new items...");
            spawn_resync(app, event_tx);
        }
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
        // Nothing to go back from outside the overlay
        KbAction::Back => {}
    }
    Action::Continue
}

/// Move focus, then fire the sentinel if focus got close to the older end.
fn navigate(app: &mut App, nav: Nav, event_tx: &mpsc::Sender<AppEvent>) {
    app.navigate(nav);
    if app.feed.sentinel_visible() {
        spawn_load(app, event_tx);
    }
}

fn noun(app: &App, n: usize) -> &'static str {
    let (singular, plural) = app.resource.noun();
    if n == 1 {
        singular
    } else {
        plural
    }
}

/// Handle input while the help overlay is visible.
///
/// Captures all keys: Next/Prev scroll, Back dismisses.
fn handle_help_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Action {
    match app
        .keybindings
        .action_for_key(code, modifiers, KbContext::Help)
    {
        Some(KbAction::Back) => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        Some(KbAction::Next) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        Some(KbAction::Prev) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur::api::{ApiClient, Entry, Post, Resource};
    use murmur::config::Config;
    use murmur::reconciler::{Page, TriggerMode};

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

    fn app(trigger: TriggerMode) -> App {
        let client = ApiClient::new("http://localhost:3000", None).unwrap();
        let page = Page::new(
            vec![post("p3"), post("p2"), post("p1")],
            None,
            Some("p1".into()),
        );
        let config = Config {
            page_size: 3,
            load_trigger: trigger,
            ..Config::default()
        };
        App::new(&client, Resource::Timeline, page, &config).unwrap()
    }

    fn press(app: &mut App, c: char, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, KeyCode::Char(c), KeyModifiers::NONE, tx)
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = app(TriggerMode::Button);
        let (tx, _rx) = mpsc::channel(4);
        assert!(matches!(press(&mut app, 'q', &tx), Action::Quit));
    }

    #[tokio::test]
    async fn test_flush_key_shows_queued() {
        let mut app = app(TriggerMode::Button);
        let (tx, _rx) = mpsc::channel(4);
        app.feed.enqueue(post("p4"));
        press(&mut app, 'n', &tx);
        assert_eq!(app.feed.len(), 4);
        assert_eq!(app.feed.pending(), 0);
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Showing 1 new post");
    }

    #[tokio::test]
    async fn test_button_mode_does_not_autoload() {
        let mut app = app(TriggerMode::Button);
        let (tx, _rx) = mpsc::channel(4);
        press(&mut app, 'G', &tx);
        assert!(!app.feed.is_loading());
        assert!(app.load_handle.is_none());
    }

    #[tokio::test]
    async fn test_sentinel_mode_autoloads_near_end() {
        let mut app = app(TriggerMode::Sentinel);
        let (tx, _rx) = mpsc::channel(4);
        press(&mut app, 'G', &tx);
        assert!(app.feed.is_loading());
        app.teardown();
    }

    #[tokio::test]
    async fn test_remove_key() {
        let mut app = app(TriggerMode::Button);
        let (tx, _rx) = mpsc::channel(4);
        press(&mut app, 'x', &tx);
        assert_eq!(app.feed.len(), 2);
        assert_eq!(app.feed.focused(), Some(0));
    }

    #[tokio::test]
    async fn test_help_overlay_captures_keys() {
        let mut app = app(TriggerMode::Button);
        let (tx, _rx) = mpsc::channel(4);
        press(&mut app, '?', &tx);
        assert!(app.show_help);
        press(&mut app, 'j', &tx);
        assert_eq!(app.help_scroll_offset, 1);
        assert_eq!(app.feed.focused(), Some(0));
        assert!(matches!(press(&mut app, 'q', &tx), Action::Continue));
        assert!(!app.show_help);
    }
}
