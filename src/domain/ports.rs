use crate::domain::model::CompletionRequest;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Hosted language model that turns one prompt into one text reply.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Whether credentials are present; callers skip synthesis otherwise.
    fn is_configured(&self) -> bool;

    /// Returns MP3 bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}
