//! Highlight marker translation and description truncation.
//!
//! Providers wrap matched terms in a pair of private-use characters. These
//! helpers either turn the pairs into `<strong>` emphasis (escaping the rest
//! of the text as HTML) or remove them.

use std::borrow::Cow;

/// Opens a highlighted span in provider text.
pub const HIGHLIGHT_START: char = '\u{e000}';
/// Closes a highlighted span in provider text.
pub const HIGHLIGHT_END: char = '\u{e001}';

const EMPHASIS_OPEN: &str = "<strong>";
const EMPHASIS_CLOSE: &str = "</strong>";
const ELLIPSIS: &str = "...";

fn is_marker(c: char) -> bool {
    c == HIGHLIGHT_START || c == HIGHLIGHT_END
}

/// Render provider text for output.
///
/// With `highlighting` on, markers become balanced emphasis tags and every
/// other character is HTML-escaped. With it off, markers are removed and
/// the text is returned as-is.
pub fn render(text: &str, highlighting: bool) -> String {
    if !highlighting {
        return strip(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut open = false;
    for c in text.chars() {
        match c {
            HIGHLIGHT_START if !open => {
                out.push_str(EMPHASIS_OPEN);
                open = true;
            }
            HIGHLIGHT_END if open => {
                out.push_str(EMPHASIS_CLOSE);
                open = false;
            }
            // Nested starts and stray ends are dropped.
            HIGHLIGHT_START | HIGHLIGHT_END => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    if open {
        out.push_str(EMPHASIS_CLOSE);
    }
    out
}

/// Remove every highlight marker.
pub fn strip(text: &str) -> String {
    text.chars().filter(|c| !is_marker(*c)).collect()
}

/// Shorten `text` to at most `max_visible` visible characters.
///
/// Markers do not count as visible. The cut falls back to the last word
/// boundary, a dangling open marker is closed, and `...` is appended. Text
/// already within the limit is returned unchanged.
pub fn truncate(text: &str, max_visible: usize) -> Cow<'_, str> {
    let visible = text.chars().filter(|c| !is_marker(*c)).count();
    if visible <= max_visible {
        return Cow::Borrowed(text);
    }

    let mut seen = 0;
    let mut cut = text.len();
    for (index, c) in text.char_indices() {
        if is_marker(c) {
            continue;
        }
        if seen == max_visible {
            cut = index;
            break;
        }
        seen += 1;
    }

    let (head, rest) = text.split_at(cut);
    let at_boundary = rest
        .chars()
        .find(|c| !is_marker(*c))
        .is_some_and(char::is_whitespace);
    let head = if at_boundary {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(index) if index > 0 => &head[..index],
            _ => head,
        }
    };

    let mut out = head.trim_end().to_owned();
    while out.ends_with(HIGHLIGHT_START) {
        out.pop();
        out = out.trim_end().to_owned();
    }
    let opens = out.matches(HIGHLIGHT_START).count();
    let closes = out.matches(HIGHLIGHT_END).count();
    if opens > closes {
        out.push(HIGHLIGHT_END);
    }
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}
