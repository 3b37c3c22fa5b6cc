use crate::{Result, TutorbotError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 50;
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub bot: BotConfig,
}

/// Settings for the chat-completion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Bearer credential, normally supplied through `GROQ_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Full URL of the chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on one completion round trip; unset keeps the transport default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_seconds: Option<u64>,
}

/// Settings for the Telegram side of the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default, skip_serializing)]
    pub telegram_token: Option<String>,

    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,

    /// Long-poll timeout passed to getUpdates
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_seconds: None,
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            api_url: default_telegram_api_url(),
            poll_timeout_seconds: default_poll_timeout(),
        }
    }
}

impl Config {
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let mut config = if config_file.exists() {
            info!("Loading config from: {}", config_file.display());
            let content = tokio::fs::read_to_string(&config_file).await.map_err(|e| {
                TutorbotError::FileRead {
                    path: config_file.display().to_string(),
                    source: e,
                }
            })?;
            toml::from_str::<Config>(&content).map_err(|e| TutorbotError::ConfigLoadFailed {
                path: config_file.display().to_string(),
                source: Box::new(e),
            })?
        } else {
            info!("No config file found, using defaults");
            Self::default()
        };

        config.load_env_overrides();
        config.provider.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "tutorbot", "tutorbot").ok_or_else(|| {
            TutorbotError::ConfigInvalid {
                issue: "Could not determine config directory".to_string(),
            }
        })?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn load_env_overrides(&mut self) {
        if let Ok(api_key) = std::env::var("GROQ_API_KEY") {
            self.provider.api_key = Some(api_key);
        }
        if let Ok(endpoint) = std::env::var("GROQ_API_URL") {
            self.provider.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("TUTORBOT_MODEL") {
            self.provider.default_model = model;
        }
        if let Some(temperature) = parse_env("TUTORBOT_TEMPERATURE") {
            self.provider.temperature = temperature;
        }
        if let Some(max_tokens) = parse_env("TUTORBOT_MAX_TOKENS") {
            self.provider.max_tokens = max_tokens;
        }
        if let Some(timeout) = parse_env("TUTORBOT_REQUEST_TIMEOUT") {
            self.provider.request_timeout_seconds = Some(timeout);
        }

        if let Ok(token) = std::env::var("TELEGRAM_TOKEN") {
            self.bot.telegram_token = Some(token);
        }
        if let Ok(api_url) = std::env::var("TELEGRAM_API_URL") {
            self.bot.api_url = api_url;
        }
    }

    /// The completion credential, or a fatal configuration error when it is absent.
    pub fn require_api_key(&self) -> Result<&str> {
        require(
            self.provider.api_key.as_deref(),
            "GROQ_API_KEY",
            "Set it in the environment or in a .env file",
        )
    }

    /// The bot platform token, or a fatal configuration error when it is absent.
    pub fn require_telegram_token(&self) -> Result<&str> {
        require(
            self.bot.telegram_token.as_deref(),
            "TELEGRAM_TOKEN",
            "Set it in the environment or in a .env file",
        )
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_model.trim().is_empty() {
            return Err(TutorbotError::ConfigInvalid {
                issue: "Default model must be specified".to_string(),
            });
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(TutorbotError::ConfigInvalid {
                issue: format!(
                    "Completion endpoint must start with http:// or https://, got '{}'",
                    self.endpoint
                ),
            });
        }

        if self.request_timeout_seconds == Some(0) {
            warn!("Request timeout is set to 0, every completion call will time out");
        }

        Ok(())
    }
}

fn require<'a>(value: Option<&'a str>, key: &str, hint: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(TutorbotError::ConfigMissing {
            key: key.to_string(),
            hint: hint.to_string(),
        }),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: could not parse '{}'", key, raw);
            None
        }
    }
}
