//! Language-model provider trait

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

/// Trait for text-completion providers.
///
/// The condense step uses the plain completion; answer generation uses the
/// streaming variant so tokens reach the caller as they are produced.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Complete a prompt and return the full response text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Complete a prompt, forwarding text fragments over `tokens` as they
    /// arrive, and return the accumulated response text.
    ///
    /// A dropped receiver means the caller went away; implementations stop
    /// forwarding and abandon the in-flight call without blocking.
    async fn complete_stream(&self, prompt: &str, tokens: mpsc::Sender<String>) -> Result<String>;

    /// Identifier of the model used for generation.
    fn model_id(&self) -> &str;
}
