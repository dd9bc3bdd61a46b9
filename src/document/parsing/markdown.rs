//! Inline emphasis markers
//!
//! Splits block text carrying `*`, `**` and `***` markers back into
//! formatted segments.

use once_cell::sync::Lazy;
use regex::Regex;

use super::super::models::FormattedRun;

// Tried in order at every position; the first match wins
static EMPHASIS_PATTERNS: Lazy<[(Regex, bool, bool); 3]> = Lazy::new(|| {
    [
        (Regex::new(r"^(?s)\*\*\*(.+?)\*\*\*").unwrap(), true, true),
        (Regex::new(r"^(?s)\*\*(.+?)\*\*").unwrap(), true, false),
        (Regex::new(r"^(?s)\*(.+?)\*").unwrap(), false, true),
    ]
});

/// Parse marked text into segments of uniform formatting
pub fn parse_inline_markdown(text: &str) -> Vec<FormattedRun> {
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut pos = 0;

    'scan: while pos < text.len() {
        let rest = &text[pos..];

        if rest.starts_with('*') {
            for (pattern, bold, italic) in EMPHASIS_PATTERNS.iter() {
                if let Some(captures) = pattern.captures(rest) {
                    if !plain.is_empty() {
                        segments.push(FormattedRun::new(std::mem::take(&mut plain), false, false));
                    }
                    segments.push(FormattedRun::new(&captures[1], *bold, *italic));
                    pos += captures[0].len();
                    continue 'scan;
                }
            }
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        plain.push(ch);
        pos += ch.len_utf8();
    }

    if !plain.is_empty() {
        segments.push(FormattedRun::new(plain, false, false));
    }

    segments
}
