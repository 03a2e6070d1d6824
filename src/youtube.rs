use std::sync::LazyLock;

use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::config::TranscriptConfig;
use crate::transcript::{TranscriptError, TranscriptProvider};
use crate::{Segment, TranscriptShape};

const USER_AGENT_HEADER: &str = "User-Agent";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<PlayerCaptions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerCaptions {
    player_captions_tracklist_renderer: Option<Tracklist>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// "asr" marks auto-generated captions
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_lang(&self, lang: &str) -> bool {
        self.language_code == lang
            || self
                .language_code
                .strip_prefix(lang)
                .is_some_and(|rest| rest.starts_with('-'))
    }
}

/// One rung of the caption fallback ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptionAttempt {
    Manual,
    AutoGenerated,
    AnyLanguage,
}

const LADDER: [CaptionAttempt; 3] = [
    CaptionAttempt::Manual,
    CaptionAttempt::AutoGenerated,
    CaptionAttempt::AnyLanguage,
];

fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    attempt: CaptionAttempt,
    lang: &str,
    tried: &[&str],
) -> Option<&'a CaptionTrack> {
    let mut candidates = tracks.iter().filter(|t| !tried.contains(&t.base_url.as_str()));
    match attempt {
        CaptionAttempt::Manual => candidates.find(|t| t.matches_lang(lang) && !t.is_generated()),
        CaptionAttempt::AutoGenerated => candidates.find(|t| t.matches_lang(lang) && t.is_generated()),
        CaptionAttempt::AnyLanguage => candidates.next(),
    }
}

/// True when the ladder settled on a track outside the preferred language
fn is_language_fallback(attempt: CaptionAttempt, track: &CaptionTrack, lang: &str) -> bool {
    attempt == CaptionAttempt::AnyLanguage && !track.matches_lang(lang)
}

/// Reads captions straight from YouTube: watch page, InnerTube player, timed-text XML
pub struct CaptionProvider {
    client: reqwest::Client,
    base_url: String,
    lang: String,
}

impl CaptionProvider {
    pub fn new(client: reqwest::Client, config: &TranscriptConfig) -> Self {
        let base_url = config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        CaptionProvider {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
        }
    }

    async fn caption_tracks(&self, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Loading watch page for {video_id}");

        let html = self.get_text(&watch_url).await?;
        let api_key = extract_api_key(&html)?;

        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);
        let request = serde_json::json!({
            "context": {
                "client": {
                    "hl": self.lang,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let player: PlayerResponse = self
            .client
            .post(&player_url)
            .header(USER_AGENT_HEADER, USER_AGENT)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let tracks = player
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .unwrap_or_default()
            .caption_tracks;
        debug!("{video_id} has {} caption tracks", tracks.len());
        Ok(tracks)
    }

    async fn get_text(&self, url: &str) -> Result<String, TranscriptError> {
        let text = self
            .client
            .get(url)
            .header(USER_AGENT_HEADER, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<Segment>, TranscriptError> {
        let xml = self.get_text(&track.base_url).await?;
        Ok(parse_caption_xml(&xml)?)
    }
}

#[async_trait]
impl TranscriptProvider for CaptionProvider {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<TranscriptShape, TranscriptError> {
        let tracks = self.caption_tracks(video_id).await?;
        if tracks.is_empty() {
            return Err(TranscriptError::NoCaptions(video_id.to_string()));
        }

        let mut tried: Vec<&str> = Vec::new();
        let mut last_err = None;

        for attempt in LADDER {
            let Some(track) = select_track(&tracks, attempt, &self.lang, &tried) else {
                debug!("No {attempt:?} caption track for {video_id}");
                continue;
            };
            tried.push(&track.base_url);

            if is_language_fallback(attempt, track, &self.lang) {
                warn!(
                    "No {} captions for {video_id}, using {} track",
                    self.lang, track.language_code
                );
            }

            match self.fetch_track(track).await {
                Ok(segments) if !segments.is_empty() => {
                    debug!(
                        "Using {attempt:?} caption track: lang={} segments={}",
                        track.language_code,
                        segments.len()
                    );
                    return Ok(TranscriptShape::Segments(segments));
                }
                Ok(_) => debug!("{attempt:?} caption track for {video_id} is empty"),
                Err(e) => {
                    warn!("{attempt:?} caption track for {video_id} failed: {e}");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| TranscriptError::NoCaptions(video_id.to_string())))
    }
}

// The watch page has carried the key under both spellings
static API_KEY_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#,
        r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#,
    ]
    .map(|p| Regex::new(p).unwrap())
});

fn extract_api_key(html: &str) -> Result<String> {
    match API_KEY_PATTERNS.iter().find_map(|re| re.captures(html)) {
        Some(caps) => Ok(caps[1].to_string()),
        None => bail!("watch page has no InnerTube API key"),
    }
}

fn seconds(value: &[u8]) -> Option<f64> {
    std::str::from_utf8(value).ok()?.trim().parse().ok()
}

/// Timed-text XML into segments; `<text>` elements with no text are dropped
fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut open: Option<Segment> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut segment = Segment::text("");
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => segment.start = seconds(&attr.value),
                        b"dur" => segment.duration = seconds(&attr.value),
                        _ => {}
                    }
                }
                open = Some(segment);
            }
            Ok(Event::Text(ref e)) => {
                let Some(segment) = open.as_mut() else { continue };
                let unescaped = e.unescape().unwrap_or_default();
                // timed-text bodies are escaped twice
                segment.text.push_str(&html_escape::decode_html_entities(&unescaped));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                if let Some(segment) = open.take().filter(|s| !s.text.is_empty()) {
                    segments.push(segment);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed caption XML at byte {}: {e}", reader.buffer_position()),
            _ => {}
        }
    }

    Ok(segments)
}
