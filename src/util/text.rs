use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Terminal columns occupied by `s`. Wide (CJK, emoji) chars count as two.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Fit `s` into `max_width` columns, ending in `...` when something was cut.
///
/// Widths of three columns or fewer have no room for an ellipsis, so the
/// result is just the leading characters that fit.
///
/// ```
/// use cuedeck::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS.len() {
        return Cow::Owned(take_columns(s, max_width).to_string());
    }
    let head = take_columns(s, max_width - ELLIPSIS.len());
    Cow::Owned(format!("{head}{ELLIPSIS}"))
}

/// Longest prefix of `s` that fits in `width` columns.
fn take_columns(s: &str, width: usize) -> &str {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            return &s[..idx];
        }
        used += w;
    }
    s
}

/// Collapse runs of whitespace (newlines included) into single spaces and trim.
///
/// Page titles often arrive wrapped across lines; list rows need one line.
pub fn single_line(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();
    let clean = !trimmed
        .as_bytes()
        .windows(2)
        .any(|w| w[0].is_ascii_whitespace() && w[1].is_ascii_whitespace())
        && !trimmed.chars().any(|c| c.is_whitespace() && c != ' ');
    if clean {
        return Cow::Borrowed(trimmed);
    }
    Cow::Owned(trimmed.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn is_stripped(c: char) -> bool {
    (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r')) || c == '\u{7f}'
}

/// Remove terminal control characters and ANSI escape sequences.
///
/// Page titles and pasted snippets are rendered straight into the terminal,
/// so anything that could move the cursor or retitle the window is dropped.
/// Tab, newline and carriage return survive. CSI sequences (`ESC [` up to a
/// final byte in `@..~`) and OSC sequences (`ESC ]` up to BEL or `ESC \`)
/// are removed whole; a lone ESC is removed by itself.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
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
        } else if !is_stripped(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
