use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

pub const ELLIPSIS: &str = "...";

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[.*?\]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Bounds applied to a transcript before it is sent for summarization
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizeOptions {
    pub min_chars: usize,
    pub max_chars: usize,
    /// Append [`ELLIPSIS`] when text was cut
    pub ellipsis: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            min_chars: 50,
            max_chars: 8000,
            ellipsis: false,
        }
    }
}

/// Remove `[Music]`, `[Applause]` and other bracketed annotations
pub fn strip_annotations(text: &str) -> String {
    BRACKETED.replace_all(text, "").into_owned()
}

/// Collapse whitespace runs to one space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Cut `text` to at most `max_chars` characters.
///
/// With `ellipsis` set, a cut text ends in [`ELLIPSIS`] on top of the bound,
/// so truncating the result again with the same bound returns it unchanged.
pub fn truncate(text: &str, max_chars: usize, ellipsis: bool) -> String {
    let cut = match text.char_indices().nth(max_chars) {
        Some((idx, _)) => idx,
        None => return text.to_string(),
    };

    let head = &text[..cut];
    if ellipsis {
        format!("{head}{ELLIPSIS}")
    } else {
        head.to_string()
    }
}

/// Clean a joined transcript and bound its length
pub fn normalize(text: &str, options: &NormalizeOptions) -> Result<String, Error> {
    let cleaned = collapse_whitespace(&strip_annotations(text));

    let chars = cleaned.chars().count();
    if chars < options.min_chars {
        return Err(Error::TranscriptTooShort {
            chars,
            min: options.min_chars,
        });
    }

    Ok(truncate(&cleaned, options.max_chars, options.ellipsis))
}
