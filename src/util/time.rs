use chrono::{DateTime, Datelike, Utc};

/// Compact age label: `now`, `5m`, `3h`, `2d`, then `Mar 14` (with the year
/// once it differs from `now`'s).
pub fn format_relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(ts);
    let minutes = age.num_minutes();

    // Clock skew puts some timestamps slightly in the future.
    if minutes < 1 {
        return "now".to_string();
    }
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = age.num_hours();
    if hours < 24 {
        return format!("{}h", hours);
    }
    let days = age.num_days();
    if days < 7 {
        return format!("{}d", days);
    }
    if ts.year() == now.year() {
        ts.format("%b %-d").to_string()
    } else {
        ts.format("%b %-d %Y").to_string()
    }
}
