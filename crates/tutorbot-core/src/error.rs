use thiserror::Error;

pub type Result<T> = std::result::Result<T, TutorbotError>;

#[derive(Error, Debug)]
pub enum TutorbotError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load configuration from {path}: {source}")]
    ConfigLoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Missing required setting {key}. {hint}")]
    ConfigMissing { key: String, hint: String },

    #[error("Invalid configuration: {issue}")]
    ConfigInvalid { issue: String },

    #[error("Provider error: {message}")]
    Provider { message: String },

    #[error("Bot error: {message}")]
    Bot { message: String },
}

impl TutorbotError {
    /// Whether the error happened while resolving startup configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TutorbotError::ConfigLoadFailed { .. }
                | TutorbotError::ConfigMissing { .. }
                | TutorbotError::ConfigInvalid { .. }
        )
    }
}
