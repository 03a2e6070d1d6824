use async_trait::async_trait;
use log::debug;

use crate::config::{Credential, TranscriptConfig};
use crate::transcript::{TranscriptError, TranscriptProvider, resolve_shape};
use crate::{Error, TranscriptShape};

pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";

/// Keyed transcript data API hosted on RapidAPI
pub struct RapidApiProvider {
    client: reqwest::Client,
    api_key: Credential,
    base_url: String,
    host: String,
    lang: String,
}

impl RapidApiProvider {
    pub fn new(client: reqwest::Client, api_key: Credential, config: &TranscriptConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", config.host));

        RapidApiProvider {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            host: config.host.clone(),
            lang: config.lang.clone(),
        }
    }
}

#[async_trait]
impl TranscriptProvider for RapidApiProvider {
    fn name(&self) -> &'static str {
        "rapidapi"
    }

    fn check_configured(&self) -> Result<(), Error> {
        self.api_key.require().map(|_| ())
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<TranscriptShape, TranscriptError> {
        let api_key = self
            .api_key
            .require()
            .map_err(|_| TranscriptError::MissingKey(self.api_key.env_var))?;

        let url = format!("{}/transcript", self.base_url);
        debug!("Fetching transcript for {video_id} from {url}");

        let resp = self
            .client
            .get(&url)
            .query(&[("video_id", video_id), ("lang", self.lang.as_str())])
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", &self.host)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TranscriptError::Status { status, body });
        }

        let json: serde_json::Value = resp.json().await?;
        resolve_shape(&json)
    }
}
