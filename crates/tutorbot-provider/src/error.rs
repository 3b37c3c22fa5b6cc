use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Network error: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },

    #[error("API request failed with status {status}")]
    ApiStatus { status: u16, body: String },

    #[error("Unexpected response shape: {reason}")]
    ResponseShape {
        reason: String,
        raw: serde_json::Value,
    },
}

/// Fieldless tag for branching on a [`ProviderError`] without matching its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Configuration,
    Network,
    ApiStatus,
    ResponseShape,
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Configuration { .. } => ProviderErrorKind::Configuration,
            ProviderError::Network { .. } => ProviderErrorKind::Network,
            ProviderError::ApiStatus { .. } => ProviderErrorKind::ApiStatus,
            ProviderError::ResponseShape { .. } => ProviderErrorKind::ResponseShape,
        }
    }

    /// True when a transport failure was caused by the configured request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Network { source } if source.is_timeout())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ProviderError::Configuration {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(source: reqwest::Error) -> Self {
        ProviderError::Network { source }
    }
}

impl From<ProviderError> for tutorbot_core::TutorbotError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Configuration { message } => {
                tutorbot_core::TutorbotError::ConfigInvalid { issue: message }
            }
            other => tutorbot_core::TutorbotError::Provider {
                message: other.to_string(),
            },
        }
    }
}
