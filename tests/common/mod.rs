//! Shared harness: serves the app on a random port with both providers
//! pointed at an `httpmock` server.

#![allow(unused)]

use httpmock::MockServer;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use tldw::Summarizer;
use tldw::config::{Config, Credential};
use tldw::rapidapi;
use tldw::server::{self, AppState};
use tldw::summarize::{self, provider_defaults};
use tldw::transcript;

pub const RAPIDAPI_KEY: &str = "test-rapidapi-key";
pub const SUMMARY_KEY: &str = "test-summary-key";
pub const SUMMARY_PATH: &str = "/openai/v1/chat/completions";
pub const VIDEO_ID: &str = "abc123";
pub const VIDEO_URL: &str = "https://www.youtube.com/watch?v=abc123&t=30s";

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
}

impl TestApp {
    /// RapidAPI transcripts, Groq summaries, both keys set
    pub async fn spawn() -> Self {
        Self::spawn_with(Config::default(), Some(RAPIDAPI_KEY), Some(SUMMARY_KEY)).await
    }

    pub async fn spawn_with(mut config: Config, rapidapi_key: Option<&str>, summary_key: Option<&str>) -> Self {
        let mock_server = MockServer::start_async().await;

        config.transcript.base_url.get_or_insert_with(|| mock_server.base_url());
        config.summary.base_url.get_or_insert_with(|| mock_server.url(SUMMARY_PATH));

        let client = Client::new();
        let (summary_env, _) = provider_defaults(config.summary.provider);
        let transcripts = transcript::build(
            client.clone(),
            &config.transcript,
            Credential::new(rapidapi::API_KEY_ENV, rapidapi_key.map(str::to_string)),
        );
        let summaries = summarize::build(
            client.clone(),
            &config.summary,
            Credential::new(summary_env, summary_key.map(str::to_string)),
        );
        let summarizer = Summarizer::new(
            transcripts,
            summaries,
            config.normalize.clone(),
            config.summary.bullet_points,
        );

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{port}");

        tokio::spawn(async move {
            if let Err(e) = server::serve(listener, AppState::new(summarizer)).await {
                eprintln!("Server error: {e}");
            }
        });

        TestApp {
            address,
            client,
            mock_server,
        }
    }

    pub async fn post_summarize(&self, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}/api/summarize", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        let status = response.status().as_u16();
        let body = response.json().await.expect("Failed to parse response JSON");
        (status, body)
    }
}

/// A transcript long enough to pass the minimum length check
pub fn long_transcript() -> String {
    "[Music] Welcome back to the channel. Today we look at how async runtimes schedule tasks \
     and why blocking calls hurt throughput. [Applause]"
        .to_string()
}

pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}
