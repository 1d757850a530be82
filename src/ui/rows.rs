//! Rendering of one API entry into a list row.
//!
//! Rows are rendered once, when an entry enters the feed or is merged, so
//! nothing here depends on the clock or the terminal width. The age column
//! is drawn per frame by the list widget instead.

use murmur::util::{single_line, truncate_to_width};
use murmur::api::{Author, Comment, Entry, Notification, Post, UserProfile};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Content beyond this many columns is cut; the widget clips the rest.
const MAX_CONTENT_WIDTH: usize = 160;

pub(crate) fn render_entry(entry: &Entry) -> Line<'static> {
    match entry {
        Entry::Post(post) => render_post(post),
        Entry::Comment(comment) => render_comment(comment),
        Entry::Notification(notification) => render_notification(notification),
        Entry::User(user) => render_user(user),
    }
}

fn author_span(author: Option<&Author>) -> Span<'static> {
    Span::styled(
        format!("@{}", single_line(Author::display(author))),
        Style::default().fg(Color::Cyan),
    )
}

fn content_span(content: &str) -> Span<'static> {
    let line = single_line(content);
    Span::raw(truncate_to_width(&line, MAX_CONTENT_WIDTH).into_owned())
}

fn counts_span(parts: &[(u64, &str)]) -> Option<Span<'static>> {
    let text: Vec<String> = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{}{}", label, n))
        .collect();
    if text.is_empty() {
        return None;
    }
    Some(Span::styled(
        format!("  {}", text.join(" ")),
        Style::default().fg(Color::DarkGray),
    ))
}

fn render_post(post: &Post) -> Line<'static> {
    let mut spans = vec![author_span(post.user.as_ref()), Span::raw("  ")];

    if let Some(topic) = &post.spoiler_of {
        spans.push(Span::styled(
            format!("[spoiler: {}]", single_line(topic)),
            Style::default().fg(Color::Yellow),
        ));
    } else if post.nsfw {
        spans.push(Span::styled("[nsfw]", Style::default().fg(Color::Red)));
    } else {
        spans.push(content_span(&post.content));
    }

    spans.extend(counts_span(&[
        (post.reactions_count, "♥"),
        (post.comments_count, "↩"),
    ]));
    Line::from(spans)
}

fn render_comment(comment: &Comment) -> Line<'static> {
    let mut spans = vec![
        author_span(comment.user.as_ref()),
        Span::raw("  "),
        content_span(&comment.content),
    ];
    spans.extend(counts_span(&[(comment.reactions_count, "♥")]));
    Line::from(spans)
}

fn render_notification(n: &Notification) -> Line<'static> {
    let (marker, style) = if n.read {
        ("  ", Style::default().fg(Color::Gray))
    } else {
        ("● ", Style::default().add_modifier(Modifier::BOLD))
    };
    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{} {}", single_line(&n.actor_summary()), n.describe()),
            style,
        ),
    ])
}

fn render_user(user: &UserProfile) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("@{}", single_line(&user.username)),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "  {} followers · {} following",
                user.followers_count, user.followees_count
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if user.followeed {
        spans.push(Span::styled("  follows you", Style::default().fg(Color::Green)));
    }
    if user.following {
        spans.push(Span::styled("  ✓", Style::default().fg(Color::Green)));
    }
    Line::from(spans)
}
