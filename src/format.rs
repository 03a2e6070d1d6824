use std::sync::LazyLock;

use regex::Regex;

pub const BULLET: &str = "• ";

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());
static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+\.)\s").unwrap());

/// True when any line already starts with a list marker
pub fn has_bullets(text: &str) -> bool {
    text.lines().any(|line| BULLET_LINE.is_match(line))
}

/// Split prose into sentences, each ending at `.`, `!` or `?` followed by whitespace
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        // keep the punctuation, drop the whitespace
        let end = m.start() + 1;
        out.push(text[start..end].trim());
        start = m.end();
    }
    out.push(text[start..].trim());

    out.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Render a summary as bullet lines, leaving already-bulleted text alone
pub fn bulletize(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() || has_bullets(text) {
        return text.to_string();
    }

    sentences(text)
        .iter()
        .map(|s| format!("{BULLET}{s}"))
        .collect::<Vec<_>>()
        .join("\n")
}
