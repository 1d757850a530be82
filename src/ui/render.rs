//! Render functions for the TUI.
//!
//! One screen: a header with the live indicator, the new-items affordance
//! when anything is queued, the feed list, its load-more footer and the
//! status bar.

use crate::app::{App, LiveStatus};
use murmur::keybindings::Action;
use murmur::reconciler::{Trigger, TriggerMode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{help, list, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 10;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Number of frames in the loading spinner animation.
pub(super) const SPINNER_FRAMES: usize = SPINNER.len();

/// Main render function.
///
/// Handles terminal size validation before rendering.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Guard against zero-width/height to prevent panics
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let affordance_height = if app.feed.pending() > 0 { 1 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(affordance_height),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    if affordance_height > 0 {
        render_affordance(f, app, chunks[1]);
    }
    list::render(f, app, chunks[2]);
    render_footer(f, app, chunks[3]);
    status::render(f, app, chunks[4]);

    if app.show_help {
        help::render(f, app);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let (indicator, color) = match app.live {
        LiveStatus::Off => (String::new(), Color::DarkGray),
        LiveStatus::Connecting => ("○ connecting".to_string(), Color::Yellow),
        LiveStatus::Live => ("● live".to_string(), Color::Green),
        LiveStatus::Reconnecting { retry_in } => (
            format!("○ reconnecting ({}s)", retry_in.as_secs().max(1)),
            Color::Yellow,
        ),
    };

    let line = Line::from(vec![
        Span::styled(" murmur ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("{} items ", app.feed.len()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(indicator, Style::default().fg(color)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// The "N new items" bar. Pressing the flush key merges them in.
fn render_affordance(f: &mut Frame, app: &App, area: Rect) {
    let Some(label) = app.feed.affordance() else {
        return;
    };
    let key = app
        .keybindings
        .key_for(Action::Flush)
        .unwrap_or_else(|| "n".to_string());

    let paragraph = Paragraph::new(format!("↑ {} (press {} to show)", label, key))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(paragraph, area);
}

/// The pagination row: spinner while loading, hint while armed, end marker
/// once the list has run out.
fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let text = if app.feed.is_loading() {
        format!("{} Loading...", SPINNER[app.spinner_frame % SPINNER_FRAMES])
    } else if let Some(hint) = load_more_hint(app) {
        hint
    } else if app.feed.no_more() && !app.feed.is_empty() {
        "· end of list ·".to_string()
    } else {
        String::new()
    };

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(paragraph, area);
}

/// Hint for the load-more row while the trigger is armed and idle.
fn load_more_hint(app: &App) -> Option<String> {
    if app.feed.is_loading() {
        return None;
    }
    let key = app
        .keybindings
        .key_for(Action::LoadMore)
        .unwrap_or_else(|| "m".to_string());
    match app.feed.trigger() {
        Trigger::Armed(TriggerMode::Button) => Some(format!("[{}] load more", key)),
        Trigger::Armed(TriggerMode::Sentinel) => {
            Some(format!("[{}] load more (or keep scrolling)", key))
        }
        Trigger::Removed => None,
    }
}
