use eyre::Result;
use log::{debug, error, info, warn};

use crate::config::Config;
use crate::error::SummaryFailure;
use crate::normalize::{self, NormalizeOptions};
use crate::summarize::{self, SummaryProvider};
use crate::transcript::{self, TranscriptProvider};
use crate::{Error, extract_video_id, format};

/// URL in, summary out: extract, fetch, normalize, summarize.
///
/// Holds no per-request state, so one instance serves concurrent requests.
pub struct Summarizer {
    transcripts: Box<dyn TranscriptProvider>,
    summaries: Box<dyn SummaryProvider>,
    normalize: NormalizeOptions,
    bullet_points: bool,
}

impl Summarizer {
    pub fn new(
        transcripts: Box<dyn TranscriptProvider>,
        summaries: Box<dyn SummaryProvider>,
        normalize: NormalizeOptions,
        bullet_points: bool,
    ) -> Self {
        Summarizer {
            transcripts,
            summaries,
            normalize,
            bullet_points,
        }
    }

    /// Wire up the providers named in `config`; credentials come from the environment
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = config.http.build_client()?;
        let transcripts = transcript::from_config(client.clone(), &config.transcript);
        let summaries = summarize::from_config(client, &config.summary);

        info!(
            "Using transcript provider {} and summary provider {}",
            transcripts.name(),
            summaries.name()
        );

        Ok(Summarizer::new(
            transcripts,
            summaries,
            config.normalize.clone(),
            config.summary.bullet_points,
        ))
    }

    pub async fn summarize_url(&self, url: &str) -> Result<String, Error> {
        let video_id = extract_video_id(url).ok_or_else(|| {
            warn!("Could not extract video ID from: {url}");
            Error::InvalidInput("Invalid YouTube URL.".to_string())
        })?;
        info!("Summarizing video {video_id}");

        self.transcripts.check_configured()?;
        self.summaries.check_configured()?;

        let shape = self.transcripts.fetch_transcript(&video_id).await.map_err(|source| {
            error!("Transcript error for {video_id} via {}: {source}", self.transcripts.name());
            Error::TranscriptUnavailable {
                video_id: video_id.clone(),
                source,
            }
        })?;

        let text = normalize::normalize(&shape.joined_text(), &self.normalize)
            .inspect_err(|e| warn!("{video_id}: {e}"))?;
        debug!("Normalized transcript for {video_id}: {} characters", text.chars().count());

        let summary = self.summaries.summarize(&text).await.map_err(|e| {
            error!("Summarization error for {video_id} via {}: {e}", self.summaries.name());
            Error::from(SummaryFailure::from(e))
        })?;

        let summary = summary.trim();
        if summary.is_empty() {
            return Err(SummaryFailure::Empty.into());
        }

        info!("Summarized video {video_id}");
        Ok(if self.bullet_points {
            format::bulletize(summary)
        } else {
            summary.to_string()
        })
    }
}
