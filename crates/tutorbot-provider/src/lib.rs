pub mod client;
pub mod error;
pub mod mapping;
pub mod mock;
pub mod models;

pub use client::{CompletionClient, CompletionClientConfig};
pub use error::{ProviderError, ProviderErrorKind, Result};
pub use mock::{MockCompletionProvider, MockOutcome};
pub use models::{
    build_request, extract_reply_text, Choice, CompletionRequest, CompletionResponse, Message,
    ProviderMetadata, Usage, NO_RESPONSE_FALLBACK,
};

/// Anything that can turn a completion request into a completion response.
///
/// The bot layer holds one of these behind an `Arc` rather than reaching for a global client.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}
