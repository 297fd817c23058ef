//! Embedding provider trait

use async_trait::async_trait;

use crate::Result;

/// Trait for services that map text to fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let mut vectors = self.embed_batch(&texts).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::ExternalService("empty embedding response".to_string()))
    }

    /// Dimension of the vectors this provider produces.
    fn dimension(&self) -> usize;
}
