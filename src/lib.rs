pub mod config;
pub mod error;
pub mod format;
pub mod normalize;
pub mod pipeline;
pub mod rapidapi;
pub mod server;
pub mod summarize;
pub mod transcript;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

pub use error::Error;
pub use pipeline::Summarizer;

/// A single captioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: Option<f64>,
    pub duration: Option<f64>,
}

impl Segment {
    /// A segment with no timing metadata
    pub fn text(text: impl Into<String>) -> Self {
        Segment {
            text: text.into(),
            start: None,
            duration: None,
        }
    }
}

/// Raw transcript as delivered by a provider, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptShape {
    FullText(String),
    Segments(Vec<Segment>),
}

impl TranscriptShape {
    /// Space-joined text of the whole transcript; timing is dropped
    pub fn joined_text(&self) -> String {
        match self {
            TranscriptShape::FullText(text) => text.clone(),
            TranscriptShape::Segments(segments) => segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

// Ordered: watch, short link, embed, shorts. First match wins.
static VIDEO_ID_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        r"(?:youtube\.com/watch\?v=)([^&\n?#]+)",
        r"(?:youtu\.be/)([^&\n?#]+)",
        r"(?:youtube\.com/embed/)([^&\n?#]+)",
        r"(?:youtube\.com/shorts/)([^&\n?#]+)",
    ]
    .map(|p| Regex::new(p).unwrap())
});

/// Extract video ID from the supported YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}
