//! Transcript acquisition: the provider interface and the resolver that turns
//! heterogeneous provider payloads into a [`TranscriptShape`].

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::{Credential, TranscriptConfig, TranscriptProviderKind};
use crate::rapidapi::{self, RapidApiProvider};
use crate::youtube::CaptionProvider;
use crate::{Error, Segment, TranscriptShape};

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("no captions available for video {0}")]
    NoCaptions(String),

    #[error("unrecognized transcript response shape")]
    UnrecognizedShape,

    #[error("transcript provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transcript request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("caption retrieval failed: {0}")]
    Caption(String),

    #[error("{0} not set")]
    MissingKey(&'static str),
}

impl From<eyre::Report> for TranscriptError {
    fn from(err: eyre::Report) -> Self {
        TranscriptError::Caption(format!("{err:#}"))
    }
}

/// Something that can turn a video ID into transcript data
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fail fast when a required credential is missing
    fn check_configured(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<TranscriptShape, TranscriptError>;
}

/// Build the configured transcript provider, reading its credential from the environment
pub fn from_config(client: reqwest::Client, config: &TranscriptConfig) -> Box<dyn TranscriptProvider> {
    build(client, config, Credential::from_env(rapidapi::API_KEY_ENV))
}

/// Like [`from_config`], with an explicit RapidAPI credential
pub fn build(client: reqwest::Client, config: &TranscriptConfig, rapidapi_key: Credential) -> Box<dyn TranscriptProvider> {
    match config.provider {
        TranscriptProviderKind::RapidApi => Box::new(RapidApiProvider::new(client, rapidapi_key, config)),
        TranscriptProviderKind::Youtube => Box::new(CaptionProvider::new(client, config)),
    }
}

type ShapeRule = fn(&Value) -> Option<TranscriptShape>;

// Probed in this order; the first rule that matches decides the shape.
const SHAPE_RULES: &[(&str, ShapeRule)] = &[
    ("array.transcriptionAsText", array_full_text),
    ("array.text", array_segments),
    ("transcription", object_transcription),
    ("transcript:string", object_transcript_string),
    ("transcript:array", object_transcript_segments),
];

/// Resolve a provider JSON payload into a transcript shape.
///
/// An empty top-level array means the provider had no captions, which is
/// reported separately from a payload nobody recognizes.
pub fn resolve_shape(json: &Value) -> Result<TranscriptShape, TranscriptError> {
    if json.as_array().is_some_and(|a| a.is_empty()) {
        return Err(TranscriptError::NoCaptions("provider returned an empty list".to_string()));
    }

    for (name, rule) in SHAPE_RULES {
        if let Some(shape) = rule(json) {
            log::debug!("Transcript payload matched shape rule {name}");
            return Ok(shape);
        }
    }

    Err(TranscriptError::UnrecognizedShape)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn segment_texts(items: &[Value]) -> Vec<Segment> {
    items
        .iter()
        .map(|item| Segment {
            text: item.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
            start: item.get("start").and_then(Value::as_f64),
            duration: item
                .get("duration")
                .or_else(|| item.get("dur"))
                .and_then(Value::as_f64),
        })
        .collect()
}

fn array_full_text(json: &Value) -> Option<TranscriptShape> {
    let first = json.as_array()?.first()?;
    non_empty_str(first.get("transcriptionAsText")).map(|s| TranscriptShape::FullText(s.to_string()))
}

fn array_segments(json: &Value) -> Option<TranscriptShape> {
    let items = json.as_array()?;
    let first = items.first()?;
    first.get("text")?;
    Some(TranscriptShape::Segments(segment_texts(items)))
}

fn object_transcription(json: &Value) -> Option<TranscriptShape> {
    non_empty_str(json.get("transcription")).map(|s| TranscriptShape::FullText(s.to_string()))
}

fn object_transcript_string(json: &Value) -> Option<TranscriptShape> {
    non_empty_str(json.get("transcript")).map(|s| TranscriptShape::FullText(s.to_string()))
}

fn object_transcript_segments(json: &Value) -> Option<TranscriptShape> {
    let items = json.get("transcript")?.as_array()?;
    Some(TranscriptShape::Segments(segment_texts(items)))
}
