//! Ingestion pipeline: load, split, embed, upsert
//!
//! One-shot batch process. Any stage failure aborts the whole run and
//! surfaces a single wrapped error; there is no retry and no resumption
//! checkpoint, so a failed run is restarted from scratch. Ids are derived
//! deterministically from chunk content, so re-running an ingest replaces
//! existing entries instead of duplicating them.

use std::sync::Arc;

use bloom_core::{
    AppConfig, DocumentChunk, EmbeddingProvider, Error, Result, VectorEntry, VectorStore,
};

use crate::loader::DirectoryLoader;
use crate::splitter::RecursiveCharacterSplitter;

/// Chunks embedded per request to the embedding service.
const EMBED_BATCH_SIZE: usize = 32;

/// Outcome of a completed ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionReport {
    pub documents: usize,
    pub chunks: usize,
}

pub struct IngestionPipeline {
    loader: DirectoryLoader,
    splitter: RecursiveCharacterSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    namespace: String,
}

impl IngestionPipeline {
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        Ok(Self {
            loader: DirectoryLoader::new(&config.docs_dir),
            splitter: RecursiveCharacterSplitter::new(config.chunk_size, config.chunk_overlap)?,
            embedder,
            store,
            namespace: config.namespace.clone(),
        })
    }

    /// Run the full pipeline. All failures surface as one wrapped
    /// ingestion error.
    pub async fn run(&self) -> Result<IngestionReport> {
        self.run_stages()
            .await
            .map_err(|e| Error::Ingestion(format!("failed to ingest catalogue data: {}", e)))
    }

    async fn run_stages(&self) -> Result<IngestionReport> {
        let documents = self.loader.load_all()?;
        tracing::info!("loaded {} catalogue documents", documents.len());

        let chunks = self.splitter.split_documents(&documents);
        if chunks.is_empty() {
            return Err(Error::NoResults(
                "catalogue produced no chunks to index".to_string(),
            ));
        }
        tracing::info!("split into {} chunks", chunks.len());

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|c| c.page_content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            let entries: Vec<VectorEntry> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| VectorEntry {
                    id: entry_id(&self.namespace, chunk),
                    vector,
                    page_content: chunk.page_content.clone(),
                    metadata: chunk.metadata.clone(),
                })
                .collect();

            self.store.upsert(&self.namespace, entries).await?;
        }

        tracing::info!(
            "upserted {} chunks into namespace {}",
            chunks.len(),
            self.namespace
        );

        Ok(IngestionReport {
            documents: documents.len(),
            chunks: chunks.len(),
        })
    }
}

/// Deterministic vector id: a UUID formed from the digest of the namespace,
/// the chunk's provenance, and its content.
fn entry_id(namespace: &str, chunk: &DocumentChunk) -> String {
    let key = format!("{}\u{1f}{}\u{1f}{}", namespace, chunk.metadata, chunk.page_content);
    let digest = md5::compute(key.as_bytes());
    uuid::Uuid::from_bytes(digest.0).to_string()
}
