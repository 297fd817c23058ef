//! Core traits and types for Bloom, the course-catalogue advisor.
//!
//! This crate defines the seams the rest of the workspace plugs into:
//! the LLM, embedding, and vector-store traits, the chat data model, the
//! error taxonomy, and environment-driven configuration. Implementations
//! live in the sibling crates.

pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod types;
pub mod vector_store;

pub use config::AppConfig;
pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use llm::LLMProvider;
pub use types::{
    CatalogueRecord, ChainEvent, ChainResponse, ChatMessage, ConversationTurn, DocumentChunk,
    RawDocument, Role, SourceDocument,
};
pub use vector_store::{VectorEntry, VectorStore};
