use crate::app::App;
use chrono::{DateTime, Utc};
use murmur::util::format_relative_time;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

/// Width of the age column, e.g. "59m " or "Mar 3 ".
const AGE_WIDTH: usize = 7;

/// Render the feed rows, or the empty-state placeholder.
pub fn render(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", app.resource.title()));

    if let Some(placeholder) = app.feed.placeholder() {
        let paragraph = Paragraph::new(placeholder.clone())
            .style(Style::default().fg(Color::Gray))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    // Ages are computed per frame; the rendered rows carry no clock.
    let now = Utc::now();
    let items: Vec<ListItem> = app
        .feed
        .items()
        .zip(app.feed.rows())
        .map(|(entry, row)| {
            let mut spans = vec![age_span(entry.timestamp(), now)];
            spans.extend(row.spans.iter().cloned());
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    app.sync_scroll();
    f.render_stateful_widget(list, area, &mut app.scroll);
}

fn age_span(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Span<'static> {
    let text = timestamp
        .map(|ts| format_relative_time(ts, now))
        .unwrap_or_default();
    Span::styled(
        format!("{:<width$}", text, width = AGE_WIDTH),
        Style::default().fg(Color::DarkGray),
    )
}
