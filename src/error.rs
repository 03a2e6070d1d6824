use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::summarize::SummaryError;
use crate::transcript::TranscriptError;

/// Why a summarization stage failed
#[derive(Debug, Error)]
pub enum SummaryFailure {
    /// The provider call errored: bad status, transport failure, undecodable body
    #[error("{0}")]
    Upstream(SummaryError),
    /// The provider answered but the result field was missing or blank
    #[error("summarization provider returned an empty result")]
    Empty,
}

impl From<SummaryError> for SummaryFailure {
    fn from(err: SummaryError) -> Self {
        match err {
            SummaryError::Empty => SummaryFailure::Empty,
            other => SummaryFailure::Upstream(other),
        }
    }
}

/// Every way a summarize request can fail, one variant per stage.
///
/// The `Display` text is for logs; callers only ever see [`Error::user_message`].
#[derive(Debug, Error)]
pub enum Error {
    /// Missing, non-string or unrecognizable URL
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A provider credential is not set
    #[error("{env_var} environment variable is not set")]
    Misconfigured { env_var: String },

    /// The transcript provider returned nothing usable
    #[error("transcript unavailable for {video_id}: {source}")]
    TranscriptUnavailable {
        video_id: String,
        #[source]
        source: TranscriptError,
    },

    /// Cleaned transcript is below the viable length
    #[error("transcript too short: {chars} characters, need at least {min}")]
    TranscriptTooShort { chars: usize, min: usize },

    #[error("summarization failed: {0}")]
    SummarizationFailed(#[from] SummaryFailure),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Misconfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::TranscriptUnavailable { .. } => StatusCode::BAD_REQUEST,
            Error::TranscriptTooShort { .. } => StatusCode::BAD_REQUEST,
            Error::SummarizationFailed(SummaryFailure::Upstream(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Error::SummarizationFailed(SummaryFailure::Empty) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the end user; never carries provider bodies
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidInput(msg) => msg.clone(),
            Error::Misconfigured { env_var } => format!("{env_var} not configured."),
            Error::TranscriptUnavailable { .. } => {
                "Could not get transcript. Video may not have captions enabled.".to_string()
            }
            Error::TranscriptTooShort { .. } => "Transcript too short or empty.".to_string(),
            Error::SummarizationFailed(SummaryFailure::Upstream(_)) => {
                "AI summarization failed. Please try again.".to_string()
            }
            Error::SummarizationFailed(SummaryFailure::Empty) => "Failed to generate summary.".to_string(),
            Error::Unexpected(_) => "An unexpected error occurred.".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        }

        let body = Json(json!({
            "error": self.user_message(),
        }));

        (status, body).into_response()
    }
}
