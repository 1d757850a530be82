use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '…';

/// Terminal columns occupied by `s`.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `max_width` columns, ending in `…` when anything was
/// dropped. Wide characters are never split.
///
/// ```
/// use murmur::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello W…");
/// assert_eq!(truncate_to_width("你好世界", 5), "你好…");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    let mut out = String::with_capacity(end + ELLIPSIS.len_utf8());
    out.push_str(&s[..end]);
    out.push(ELLIPSIS);
    Cow::Owned(out)
}

/// Flatten untrusted text into one printable line.
///
/// ANSI escape sequences (CSI and OSC) and other control characters are
/// removed so server content can't drive the terminal; runs of whitespace,
/// including newlines, collapse to a single space.
pub fn single_line(s: &str) -> Cow<'_, str> {
    let clean = !s.chars().any(|c| c.is_control())
        && !s.contains("  ")
        && s.trim().len() == s.len();
    if clean {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut pending_space = false;

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    // Parameters, then one final byte in '@'..='~'
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    // Until BEL or ST (ESC \)
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if c.is_control() {
            continue;
        }

        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_is_borrowed() {
        assert!(matches!(truncate_to_width("hello", 5), Cow::Borrowed(_)));
    }

    #[test]
    fn test_ascii_truncation() {
        let out = truncate_to_width("The quick brown fox", 10);
        assert_eq!(out, "The quick…");
        assert_eq!(display_width(&out), 10);
    }

    #[test]
    fn test_wide_chars_not_split() {
        // 4 columns of budget before the ellipsis fits two CJK chars.
        assert_eq!(truncate_to_width("你好世界", 5), "你好…");
        // 3 columns of budget still fits only one.
        assert_eq!(truncate_to_width("你好世界", 4), "你…");
    }

    #[test]
    fn test_tiny_widths() {
        assert_eq!(truncate_to_width("Test", 0), "");
        assert_eq!(truncate_to_width("Test", 1), "…");
        assert_eq!(truncate_to_width("Test", 2), "T…");
    }

    #[test]
    fn test_single_line_collapses_whitespace() {
        assert_eq!(single_line("  hello\n\n  world\t!  "), "hello world !");
    }

    #[test]
    fn test_single_line_clean_text_borrowed() {
        assert!(matches!(single_line("just text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_single_line_strips_escape_sequences() {
        assert_eq!(single_line("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(single_line("a\x1b]0;title\x07b"), "ab");
        assert_eq!(single_line("a\x1b]8;;http://x\x1b\\b"), "ab");
        assert_eq!(single_line("bell\x07 \x00nul"), "bell nul");
    }

    #[test]
    fn test_single_line_keeps_unicode() {
        assert_eq!(single_line("héllo\n🎉"), "héllo 🎉");
    }
}
