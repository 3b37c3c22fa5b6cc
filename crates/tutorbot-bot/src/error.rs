use thiserror::Error;

pub type Result<T> = std::result::Result<T, BotError>;

#[derive(Error, Debug)]
pub enum BotError {
    /// Transport failure; the request URL (which embeds the token) is stripped.
    #[error("Telegram HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Telegram API error{}: {description}", .error_code.map(|c| format!(" {}", c)).unwrap_or_default())]
    Api {
        description: String,
        error_code: Option<i64>,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Http(err.without_url())
    }
}

impl From<BotError> for tutorbot_core::TutorbotError {
    fn from(err: BotError) -> Self {
        match err {
            BotError::Configuration { message } => {
                tutorbot_core::TutorbotError::ConfigInvalid { issue: message }
            }
            other => tutorbot_core::TutorbotError::Bot {
                message: other.to_string(),
            },
        }
    }
}
