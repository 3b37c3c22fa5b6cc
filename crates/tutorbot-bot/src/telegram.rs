//! Minimal Telegram Bot API client: long-polling for updates and sending text replies.

use crate::error::{BotError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use tutorbot_core::config::BotConfig;

/// Slack added on top of the long-poll timeout for the HTTP request itself.
const POLL_SLACK: Duration = Duration::from_secs(10);

/// Longest text `sendMessage` accepts, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApi").finish_non_exhaustive()
    }
}

impl TelegramApi {
    pub fn new(api_url: &str, token: &str, poll_timeout: Duration) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(BotError::Configuration {
                message: "TELEGRAM_TOKEN not found in environment variables".to_string(),
            });
        }

        let client = Client::builder()
            .timeout(poll_timeout + POLL_SLACK)
            .build()
            .map_err(|e| BotError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    pub fn from_config(config: &BotConfig) -> Result<Self> {
        Self::new(
            &config.api_url,
            config.telegram_token.as_deref().unwrap_or_default(),
            Duration::from_secs(config.poll_timeout_seconds),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    /// Check the token and return the bot's own account.
    pub async fn get_me(&self) -> Result<User> {
        self.call(self.client.get(self.method_url("getMe"))).await
    }

    /// Long-poll for updates with `update_id >= offset`.
    #[instrument(skip(self))]
    pub async fn get_updates(&self, offset: i64, timeout_seconds: u64) -> Result<Vec<Update>> {
        let request = self.client.get(self.method_url("getUpdates")).query(&[
            ("offset", offset.to_string()),
            ("timeout", timeout_seconds.to_string()),
            ("allowed_updates", "[\"message\"]".to_string()),
        ]);
        self.call(request).await
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<IncomingMessage> {
        let request = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text });
        self.call(request).await
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "Telegram API responded");

        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| BotError::Api {
                description: format!("unreadable response (HTTP {}): {}", status.as_u16(), e),
                error_code: Some(i64::from(status.as_u16())),
            })?;

        match envelope {
            ApiEnvelope {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiEnvelope {
                description,
                error_code,
                ..
            } => Err(BotError::Api {
                description: description.unwrap_or_else(|| "no result".to_string()),
                error_code: error_code.or(Some(i64::from(status.as_u16()))),
            }),
        }
    }
}

/// Offset that acknowledges every update in `updates`.
pub fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .fold(current, i64::max)
}

/// Split `text` into pieces `sendMessage` accepts, breaking after a newline when one is in range.
pub fn split_message(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while let Some((limit, _)) = rest.char_indices().nth(MAX_MESSAGE_LENGTH) {
        let cut = match rest[..limit].rfind('\n') {
            Some(i) if !rest[..i].trim().is_empty() => i + 1,
            _ => limit,
        };
        chunks.push(&rest[..cut]);
        rest = &rest[cut..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest);
    }
    chunks
}
