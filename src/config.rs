use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Result, WrapErr};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::normalize::NormalizeOptions;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub transcript: TranscriptConfig,
    pub summary: SummaryConfig,
    pub normalize: NormalizeOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Outbound HTTP settings. Nothing is bounded unless configured.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        builder.build().wrap_err("failed to build HTTP client")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
pub enum TranscriptProviderKind {
    #[default]
    #[serde(rename = "rapidapi")]
    #[value(name = "rapidapi")]
    RapidApi,
    #[serde(rename = "youtube")]
    Youtube,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TranscriptConfig {
    pub provider: TranscriptProviderKind,
    /// Preferred caption language
    pub lang: String,
    pub base_url: Option<String>,
    /// RapidAPI host header
    pub host: String,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        TranscriptConfig {
            provider: TranscriptProviderKind::default(),
            lang: "en".to_string(),
            base_url: None,
            host: "youtube-transcriptor.p.rapidapi.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryProviderKind {
    #[default]
    Groq,
    Openai,
    Anthropic,
    Huggingface,
    HuggingfaceInstruct,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub provider: SummaryProviderKind,
    /// Falls back to the provider's default model
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Reformat prose output into bullet lines
    pub bullet_points: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        SummaryConfig {
            provider: SummaryProviderKind::default(),
            model: None,
            base_url: None,
            max_tokens: 500,
            temperature: 0.7,
            bullet_points: true,
        }
    }
}

impl Config {
    /// Load config from `path`, or from ~/.config/tldw/config.toml if it exists.
    ///
    /// An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!("No config file found at {}", path.display());
                    Ok(Config::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content =
            std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read config {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).wrap_err_with(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("tldw")
        .join("config.toml")
}

/// An API key looked up from the environment, checked on every request
#[derive(Debug, Clone)]
pub struct Credential {
    pub env_var: &'static str,
    value: Option<String>,
}

impl Credential {
    pub fn new(env_var: &'static str, value: Option<String>) -> Self {
        Credential {
            env_var,
            value: value.filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn from_env(env_var: &'static str) -> Self {
        Self::new(env_var, std::env::var(env_var).ok())
    }

    pub fn require(&self) -> Result<&str, Error> {
        self.value.as_deref().ok_or_else(|| Error::Misconfigured {
            env_var: self.env_var.to_string(),
        })
    }
}
