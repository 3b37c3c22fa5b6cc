use crate::error::{ProviderError, Result};
use crate::mapping;
use crate::models::{CompletionRequest, CompletionResponse};
use crate::CompletionProvider;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use tutorbot_core::config::{ProviderConfig, DEFAULT_ENDPOINT};

/// Completion client configuration
#[derive(Clone)]
pub struct CompletionClientConfig {
    pub api_key: String,
    /// Full chat completions URL
    pub endpoint: String,
    /// `None` keeps the transport default (no timeout)
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for CompletionClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionClientConfig")
            .field("api_key", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for CompletionClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: None,
        }
    }
}

impl From<&ProviderConfig> for CompletionClientConfig {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone().unwrap_or_default(),
            endpoint: config.endpoint.clone(),
            request_timeout: config.request_timeout_seconds.map(Duration::from_secs),
        }
    }
}

/// Authenticated client for the chat completions endpoint.
///
/// Performs exactly one POST per call. Nothing is retried or cached.
#[derive(Debug)]
pub struct CompletionClient {
    client: Client,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(config: CompletionClientConfig) -> Result<Self> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::configuration(
                "GROQ_API_KEY not found in environment variables",
            ));
        }

        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| ProviderError::configuration(format!("Invalid API key format: {}", e)))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("tutorbot/", env!("CARGO_PKG_VERSION"))),
        );

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            ProviderError::configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    pub fn from_provider_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(config.into())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    pub async fn get_completion(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        debug!("Making chat completion request to: {}", self.endpoint);

        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            // The status alone classifies the failure; a body we cannot read stays empty
            let body = response.text().await.unwrap_or_else(|e| {
                warn!(status = status.as_u16(), error = %e, "Failed to read error response body");
                String::new()
            });
            error!(
                status = status.as_u16(),
                body = %body,
                "API request failed with status {}",
                status.as_u16()
            );
            return Err(ProviderError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!("Received response: {}", body);

        mapping::parse_body(&body).map_err(|err| {
            if let ProviderError::ResponseShape { reason, raw } = &err {
                error!(reason = %reason, response = %raw, "Error parsing response");
            }
            err
        })
    }
}

#[async_trait::async_trait]
impl CompletionProvider for CompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.get_completion(request).await
    }
}
