use crate::error::{ProviderError, Result};
use crate::models::{
    Choice, CompletionRequest, CompletionResponse, Message, ProviderMetadata, Usage,
};
use crate::CompletionProvider;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Echo the last user message back
    Echo,
    /// Reply with a single choice carrying this content
    Reply(String),
    /// Reply with an empty `choices` list
    NoChoices,
    /// Fail as if the API returned this status and body
    ApiStatus { status: u16, body: String },
    /// Fail as if the API returned a malformed body
    ResponseShape { reason: String },
    /// Fail as if the provider had no usable credential
    Configuration { message: String },
}

/// Offline provider for development and tests.
///
/// Records every request it receives.
#[derive(Debug)]
pub struct MockCompletionProvider {
    outcome: MockOutcome,
    requests: Mutex<Vec<CompletionRequest>>,
    counter: AtomicU64,
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::new(MockOutcome::Echo)
    }
}

impl MockCompletionProvider {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn replying(content: impl Into<String>) -> Self {
        Self::new(MockOutcome::Reply(content.into()))
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    fn response(&self, request: &CompletionRequest, choices: Vec<Choice>) -> CompletionResponse {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let prompt_tokens = request
            .messages
            .iter()
            .map(|m| m.content.split_whitespace().count() as u32)
            .sum::<u32>();
        let completion_tokens = choices
            .iter()
            .map(|c| c.message.content.split_whitespace().count() as u32)
            .sum::<u32>();

        CompletionResponse {
            id: format!("mock-{}", n),
            object: "chat.completion".to_string(),
            created: 0,
            model: request.model.clone(),
            choices,
            usage: Usage {
                queue_time: 0.0,
                prompt_tokens,
                prompt_time: 0.0,
                completion_tokens,
                completion_time: 0.0,
                total_tokens: prompt_tokens + completion_tokens,
                total_time: 0.0,
            },
            system_fingerprint: "mock".to_string(),
            provider_metadata: ProviderMetadata {
                id: format!("mock-req-{}", n),
            },
        }
    }
}

fn single_choice(content: String) -> Vec<Choice> {
    vec![Choice {
        index: 0,
        message: Message::assistant(content),
        logprobs: None,
        finish_reason: Some("stop".to_string()),
    }]
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.requests.lock().await.push(request.clone());

        match &self.outcome {
            MockOutcome::Echo => {
                let reply = match request.last_user_message() {
                    Some(last) => format!("(offline mode) I received: \"{}\"", last.content.trim()),
                    None => "I'm running without a configured provider. Set GROQ_API_KEY to get live responses.".to_string(),
                };
                Ok(self.response(request, single_choice(reply)))
            }
            MockOutcome::Reply(content) => Ok(self.response(request, single_choice(content.clone()))),
            MockOutcome::NoChoices => Ok(self.response(request, Vec::new())),
            MockOutcome::ApiStatus { status, body } => Err(ProviderError::ApiStatus {
                status: *status,
                body: body.clone(),
            }),
            MockOutcome::ResponseShape { reason } => Err(ProviderError::ResponseShape {
                reason: reason.clone(),
                raw: serde_json::Value::Null,
            }),
            MockOutcome::Configuration { message } => Err(ProviderError::Configuration {
                message: message.clone(),
            }),
        }
    }
}
