use crate::command::BotCommand;
use crate::youtube;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use tutorbot_core::config::{ProviderConfig, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use tutorbot_provider::{
    build_request, extract_reply_text, CompletionProvider, ProviderError, NO_RESPONSE_FALLBACK,
};

pub const START_REPLY: &str =
    "Hi! I am your IELTS search bot. Use /search followed by your question.";
pub const HELP_REPLY: &str = "Available commands:\n\
/search <question> - ask me anything about the IELTS exam\n\
/youtube <topic> - get a YouTube search link for a topic\n\
/help - show this message";
pub const SEARCH_USAGE_REPLY: &str = "Please add your question after /search, for example: /search how is the speaking test scored?";
pub const ERROR_REPLY: &str =
    "Sorry, something went wrong while generating a reply. Please try again later.";
pub const UNKNOWN_COMMAND_REPLY: &str = "Sorry, I don't know that command. Try /help.";

/// Model settings applied to every completion request the handler builds.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl From<&ProviderConfig> for RequestDefaults {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// Turns incoming chat text into reply text.
///
/// This is where provider failures stop: they are logged with full detail and the user
/// only ever sees [`ERROR_REPLY`].
#[derive(Clone)]
pub struct CommandHandler {
    provider: Arc<dyn CompletionProvider>,
    defaults: RequestDefaults,
    bot_username: Option<String>,
}

impl CommandHandler {
    pub fn new(provider: Arc<dyn CompletionProvider>, defaults: RequestDefaults) -> Self {
        Self {
            provider,
            defaults,
            bot_username: None,
        }
    }

    /// Only accept `/cmd@name` suffixes that match this username.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Reply for a message text, or `None` when the text is not addressed to the bot.
    pub async fn handle(&self, text: &str) -> Option<String> {
        let command = BotCommand::parse(text, self.bot_username.as_deref())?;
        debug!(?command, "Dispatching command");

        let reply = match command {
            BotCommand::Start => START_REPLY.to_string(),
            BotCommand::Help => HELP_REPLY.to_string(),
            BotCommand::Search(question) if question.is_empty() => SEARCH_USAGE_REPLY.to_string(),
            BotCommand::Search(question) => self.answer(&question).await,
            BotCommand::Youtube(query) => youtube::search_link(&query),
            BotCommand::Unknown(name) => {
                debug!(command = %name, "Unknown command");
                UNKNOWN_COMMAND_REPLY.to_string()
            }
        };
        Some(reply)
    }

    /// Ask the provider and return the reply text, or the generic apology on failure.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn answer(&self, question: &str) -> String {
        let request = build_request(question)
            .with_model(self.defaults.model.clone())
            .with_temperature(self.defaults.temperature)
            .with_max_tokens(self.defaults.max_tokens);

        match self.provider.complete(&request).await {
            Ok(response) => {
                info!(
                    response_id = %response.id,
                    choices = response.choices.len(),
                    total_tokens = response.usage.total_tokens,
                    "Completion received"
                );
                let text = extract_reply_text(&response);
                if text.trim().is_empty() {
                    // Telegram rejects empty messages
                    debug!("First choice has no content");
                    NO_RESPONSE_FALLBACK.to_string()
                } else {
                    text
                }
            }
            Err(err) => {
                log_failure(&err);
                ERROR_REPLY.to_string()
            }
        }
    }
}

fn log_failure(err: &ProviderError) {
    match err {
        ProviderError::ApiStatus { status, body } => {
            error!(kind = ?err.kind(), status, body = %body, "Completion API rejected the request");
        }
        ProviderError::ResponseShape { reason, raw } => {
            error!(kind = ?err.kind(), reason = %reason, response = %raw, "Completion response could not be mapped");
        }
        ProviderError::Network { source } => {
            error!(kind = ?err.kind(), timeout = err.is_timeout(), error = %source, "Network error talking to completion API");
        }
        ProviderError::Configuration { message } => {
            error!(kind = ?err.kind(), message = %message, "Completion provider is misconfigured");
        }
    }
}
