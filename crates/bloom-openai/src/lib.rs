//! OpenAI-compatible client for Bloom
//!
//! Implements the `LLMProvider` and `EmbeddingProvider` seams against any
//! OpenAI-style HTTP API: batched `/embeddings` calls for the ingestion
//! pipeline and `/chat/completions` (plain and SSE-streamed) for the query
//! pipeline.

mod client;
mod config;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;

// Re-export core types for convenience
pub use bloom_core::{EmbeddingProvider, Error, LLMProvider, Result};
