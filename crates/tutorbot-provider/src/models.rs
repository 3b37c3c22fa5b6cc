use serde::{Deserialize, Serialize};
use tutorbot_core::config::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// Reply text used when the API answers with no choices at all.
pub const NO_RESPONSE_FALLBACK: &str = "No response generated";

/// Chat Completions request body
///
/// Serializes to exactly `{model, messages, stream, temperature, max_tokens}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Sent as given; streamed bodies are never parsed by the client
    pub stream: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            messages,
            stream: false,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Last user-role message, if any.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == "user")
    }
}

/// Chat Completions response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
    pub system_fingerprint: String,
    #[serde(rename = "x_groq")]
    pub provider_metadata: ProviderMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    #[serde(default)]
    pub logprobs: Option<serde_json::Value>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token and timing accounting; times are in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub queue_time: f64,
    pub prompt_tokens: u32,
    pub prompt_time: f64,
    pub completion_tokens: u32,
    pub completion_time: f64,
    pub total_tokens: u32,
    pub total_time: f64,
}

/// Provider-specific extension block (`x_groq`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub id: String,
}

/// Wrap `user_text` as a single user message with the default model settings.
pub fn build_request(user_text: &str) -> CompletionRequest {
    CompletionRequest::new(vec![Message::user(user_text)])
}

/// Content of the first choice, or [`NO_RESPONSE_FALLBACK`] when there are none.
pub fn extract_reply_text(response: &CompletionResponse) -> String {
    response
        .choices
        .first()
        .map(|choice| choice.message.content.clone())
        .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string())
}
