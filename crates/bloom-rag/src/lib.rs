//! Ingestion pipeline and conversational retrieval chain for Bloom
//!
//! The ingestion side loads catalogue CSV files, splits them into bounded
//! overlapping chunks, embeds each chunk, and upserts the vectors into a
//! namespaced Qdrant collection. The query side condenses follow-up
//! questions, retrieves the top-k most similar chunks, and streams a
//! grounded answer from the language model.

mod chain;
mod loader;
mod pipeline;
mod splitter;
mod templates;
mod vector_store;


pub use chain::{ChainOptions, ConversationalRetrievalChain, GENERIC_FAILURE, sanitize_model_output};
pub use loader::{CsvCatalogueLoader, DirectoryLoader};
pub use pipeline::{IngestionPipeline, IngestionReport};
pub use splitter::RecursiveCharacterSplitter;
pub use templates::{CONDENSE_TEMPLATE, QA_TEMPLATE};
pub use vector_store::QdrantVectorStore;

// Re-export core types for convenience
pub use bloom_core::{
    ChainEvent, ChainResponse, ConversationTurn, DocumentChunk, EmbeddingProvider, Error,
    LLMProvider, RawDocument, Result, SourceDocument, VectorEntry, VectorStore,
};
