use async_trait::async_trait;

use super::types::{CompletionRequest, TransportError};

/// Common trait for completion providers
/// The interpreter only needs the text of one completion; tests plug in a scripted fake
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Run one completion and return its text content
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError>;

    /// Get the name of the provider
    fn provider_name(&self) -> &'static str;
}
