//! Vector store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::SourceDocument;
use crate::Result;

/// An (id, vector, text, metadata) triple to upsert into the index.
///
/// Ids are opaque to the store; upserting an existing id replaces the entry,
/// which is the only dedup the ingestion pipeline relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub page_content: String,
    pub metadata: serde_json::Value,
}

/// Trait for namespaced vector indexes (e.g. Qdrant, Pinecone).
///
/// A namespace is a logical partition isolating one dataset's vectors from
/// another's; every operation is scoped to one.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Initialize the connection and any backing collection.
    async fn connect(&mut self) -> Result<()>;

    /// Write entries into the namespace, replacing entries with matching ids.
    async fn upsert(&self, namespace: &str, entries: Vec<VectorEntry>) -> Result<()>;

    /// Nearest-neighbor search for the `top_k` most similar stored chunks.
    async fn similarity_search(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<SourceDocument>>;

    /// Number of entries stored in the namespace.
    async fn count(&self, namespace: &str) -> Result<usize>;

    /// Whether the store has an established connection.
    fn is_connected(&self) -> bool;
}
