use async_trait::async_trait;
use log::debug;
use serde_json::{Value, json};
use thiserror::Error;

use crate::Error;
use crate::config::{Credential, SummaryConfig, SummaryProviderKind};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes YouTube videos. \
Create clear, concise summaries in bullet point format.";

const USER_PROMPT: &str = "Summarize this YouTube video transcript in 4-6 bullet points. \
Focus on the main ideas and key takeaways:";

const HF_MIN_LENGTH: u32 = 30;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summarization API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("summarization request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("could not decode summarization response: {0}")]
    Decode(String),

    #[error("summarization response had no text")]
    Empty,

    #[error("{0} not set")]
    MissingKey(&'static str),
}

/// Something that can condense a transcript into a summary
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fail fast when a required credential is missing
    fn check_configured(&self) -> Result<(), Error>;

    async fn summarize(&self, transcript: &str) -> Result<String, SummaryError>;
}

/// Generation settings shared by every provider
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

fn user_message(transcript: &str) -> String {
    format!("{USER_PROMPT}\n\n{transcript}")
}

async fn post_json(request: reqwest::RequestBuilder, body: &Value) -> Result<Value, SummaryError> {
    let resp = request.json(body).send().await?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(SummaryError::Status { status, body });
    }

    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| SummaryError::Decode(e.to_string()))
}

fn non_blank(text: Option<&str>) -> Result<String, SummaryError> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or(SummaryError::Empty)
}

/// OpenAI-compatible chat completions (OpenAI, Groq)
pub struct ChatCompletionProvider {
    client: reqwest::Client,
    name: &'static str,
    endpoint: String,
    api_key: Credential,
    options: GenerationOptions,
}

impl ChatCompletionProvider {
    pub fn new(
        client: reqwest::Client,
        name: &'static str,
        endpoint: String,
        api_key: Credential,
        options: GenerationOptions,
    ) -> Self {
        ChatCompletionProvider {
            client,
            name,
            endpoint,
            api_key,
            options,
        }
    }

    fn request_body(&self, transcript: &str) -> Value {
        json!({
            "model": self.options.model,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": user_message(transcript)
                }
            ],
            "temperature": self.options.temperature,
            "max_tokens": self.options.max_tokens,
        })
    }
}

#[async_trait]
impl SummaryProvider for ChatCompletionProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn check_configured(&self) -> Result<(), Error> {
        self.api_key.require().map(|_| ())
    }

    async fn summarize(&self, transcript: &str) -> Result<String, SummaryError> {
        let api_key = self.api_key.require().map_err(|_| SummaryError::MissingKey(self.api_key.env_var))?;
        debug!("Summarizing via {} with model {}", self.name, self.options.model);

        let request = self.client.post(&self.endpoint).bearer_auth(api_key);
        let json = post_json(request, &self.request_body(transcript)).await?;
        extract_chat_text(&json)
    }
}

fn extract_chat_text(json: &Value) -> Result<String, SummaryError> {
    non_blank(
        json.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str),
    )
}

/// Anthropic Messages API
pub struct AnthropicProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Credential,
    options: GenerationOptions,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: Credential, options: GenerationOptions) -> Self {
        AnthropicProvider {
            client,
            endpoint,
            api_key,
            options,
        }
    }

    fn request_body(&self, transcript: &str) -> Value {
        json!({
            "model": self.options.model,
            "max_tokens": self.options.max_tokens,
            "temperature": self.options.temperature,
            "system": SYSTEM_PROMPT,
            "messages": [
                {
                    "role": "user",
                    "content": user_message(transcript)
                }
            ]
        })
    }
}

#[async_trait]
impl SummaryProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn check_configured(&self) -> Result<(), Error> {
        self.api_key.require().map(|_| ())
    }

    async fn summarize(&self, transcript: &str) -> Result<String, SummaryError> {
        let api_key = self.api_key.require().map_err(|_| SummaryError::MissingKey(self.api_key.env_var))?;
        debug!("Summarizing via Anthropic API with model {}", self.options.model);

        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01");
        let json = post_json(request, &self.request_body(transcript)).await?;
        extract_anthropic_text(&json)
    }
}

fn extract_anthropic_text(json: &Value) -> Result<String, SummaryError> {
    let text = json
        .get("content")
        .and_then(|c| c.as_array())
        .map(|content| {
            content
                .iter()
                .filter_map(|block| {
                    if block.get("type")?.as_str()? == "text" {
                        block.get("text")?.as_str()
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
                .join("")
        });
    non_blank(text.as_deref())
}

/// Payload style for the Hugging Face inference API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostedModelKind {
    /// Dedicated summarization model, returns `summary_text`
    Summarization,
    /// Instruction-following model, returns `generated_text`
    Instruct,
}

/// Hosted model on the Hugging Face inference API
pub struct HostedModelProvider {
    client: reqwest::Client,
    kind: HostedModelKind,
    endpoint: String,
    api_key: Credential,
    options: GenerationOptions,
}

impl HostedModelProvider {
    pub fn new(
        client: reqwest::Client,
        kind: HostedModelKind,
        endpoint: String,
        api_key: Credential,
        options: GenerationOptions,
    ) -> Self {
        HostedModelProvider {
            client,
            kind,
            endpoint,
            api_key,
            options,
        }
    }

    fn request_body(&self, transcript: &str) -> Value {
        match self.kind {
            HostedModelKind::Summarization => json!({
                "inputs": transcript,
                "parameters": {
                    "max_length": self.options.max_tokens,
                    "min_length": HF_MIN_LENGTH,
                    "do_sample": false
                }
            }),
            HostedModelKind::Instruct => json!({
                "inputs": instruct_prompt(transcript),
                "parameters": {
                    "max_new_tokens": self.options.max_tokens,
                    "temperature": self.options.temperature,
                    "return_full_text": false
                }
            }),
        }
    }
}

fn instruct_prompt(transcript: &str) -> String {
    format!("<s>[INST] {SYSTEM_PROMPT}\n\n{} [/INST]", user_message(transcript))
}

#[async_trait]
impl SummaryProvider for HostedModelProvider {
    fn name(&self) -> &'static str {
        match self.kind {
            HostedModelKind::Summarization => "huggingface",
            HostedModelKind::Instruct => "huggingface-instruct",
        }
    }

    fn check_configured(&self) -> Result<(), Error> {
        self.api_key.require().map(|_| ())
    }

    async fn summarize(&self, transcript: &str) -> Result<String, SummaryError> {
        let api_key = self.api_key.require().map_err(|_| SummaryError::MissingKey(self.api_key.env_var))?;
        debug!("Summarizing via Hugging Face model {}", self.options.model);

        let request = self.client.post(&self.endpoint).bearer_auth(api_key);
        let json = post_json(request, &self.request_body(transcript)).await?;
        extract_hosted_text(&json, self.kind)
    }
}

fn extract_hosted_text(json: &Value, kind: HostedModelKind) -> Result<String, SummaryError> {
    let field = match kind {
        HostedModelKind::Summarization => "summary_text",
        HostedModelKind::Instruct => "generated_text",
    };
    // Both a one-element list and a bare object are seen in the wild
    let first = json.as_array().and_then(|a| a.first()).unwrap_or(json);
    non_blank(first.get(field).and_then(Value::as_str))
}

/// Build the configured summary provider, reading its credential from the environment
pub fn from_config(client: reqwest::Client, config: &SummaryConfig) -> Box<dyn SummaryProvider> {
    let (env_var, _) = provider_defaults(config.provider);
    build(client, config, Credential::from_env(env_var))
}

/// Like [`from_config`], with an explicit credential
pub fn build(client: reqwest::Client, config: &SummaryConfig, api_key: Credential) -> Box<dyn SummaryProvider> {
    let (endpoint, options) = resolve_target(config);

    match config.provider {
        SummaryProviderKind::Groq => Box::new(ChatCompletionProvider::new(client, "groq", endpoint, api_key, options)),
        SummaryProviderKind::Openai => {
            Box::new(ChatCompletionProvider::new(client, "openai", endpoint, api_key, options))
        }
        SummaryProviderKind::Anthropic => Box::new(AnthropicProvider::new(client, endpoint, api_key, options)),
        SummaryProviderKind::Huggingface => Box::new(HostedModelProvider::new(
            client,
            HostedModelKind::Summarization,
            endpoint,
            api_key,
            options,
        )),
        SummaryProviderKind::HuggingfaceInstruct => Box::new(HostedModelProvider::new(
            client,
            HostedModelKind::Instruct,
            endpoint,
            api_key,
            options,
        )),
    }
}

/// Endpoint and generation settings after applying config overrides to the provider defaults
fn resolve_target(config: &SummaryConfig) -> (String, GenerationOptions) {
    let (_, default_model) = provider_defaults(config.provider);
    let model = config.model.clone().unwrap_or_else(|| default_model.to_string());
    let endpoint = config
        .base_url
        .clone()
        .unwrap_or_else(|| default_endpoint(config.provider, &model));

    let options = GenerationOptions {
        model,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };
    (endpoint, options)
}

/// Credential variable and default model per provider
pub fn provider_defaults(kind: SummaryProviderKind) -> (&'static str, &'static str) {
    match kind {
        SummaryProviderKind::Groq => ("GROQ_API_KEY", "llama-3.1-8b-instant"),
        SummaryProviderKind::Openai => ("OPENAI_API_KEY", "gpt-4o-mini"),
        SummaryProviderKind::Anthropic => ("ANTHROPIC_API_KEY", "claude-sonnet-4-6"),
        SummaryProviderKind::Huggingface => ("HUGGINGFACE_API_KEY", "facebook/bart-large-cnn"),
        SummaryProviderKind::HuggingfaceInstruct => ("HUGGINGFACE_API_KEY", "mistralai/Mistral-7B-Instruct-v0.2"),
    }
}

/// Hugging Face addresses the model in the URL; the others take it in the body
pub fn default_endpoint(kind: SummaryProviderKind, model: &str) -> String {
    match kind {
        SummaryProviderKind::Groq => "https://api.groq.com/openai/v1/chat/completions".to_string(),
        SummaryProviderKind::Openai => "https://api.openai.com/v1/chat/completions".to_string(),
        SummaryProviderKind::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
        SummaryProviderKind::Huggingface | SummaryProviderKind::HuggingfaceInstruct => {
            format!("https://api-inference.huggingface.co/models/{model}")
        }
    }
}
