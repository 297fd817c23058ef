//! Application configuration

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings shared by the ingestion pipeline, the retrieval chain, and the
/// server. Everything is environment-driven with workable defaults; only the
/// OpenAI credentials (handled by `bloom-openai`) are mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub qdrant_url: String,
    pub collection: String,
    pub namespace: String,
    pub docs_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embedding_dimension: usize,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            qdrant_url: env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".to_string()),
            collection: env::var("BLOOM_COLLECTION")
                .unwrap_or_else(|_| "bloom".to_string()),
            namespace: env::var("BLOOM_NAMESPACE")
                .unwrap_or_else(|_| "course-catalogue".to_string()),
            docs_dir: env::var("BLOOM_DOCS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("docs")),
            chunk_size: parse_env("BLOOM_CHUNK_SIZE", 1000)?,
            chunk_overlap: parse_env("BLOOM_CHUNK_OVERLAP", 200)?,
            top_k: parse_env("BLOOM_TOP_K", 4)?,
            embedding_dimension: parse_env("BLOOM_EMBEDDING_DIMENSION", 1536)?,
            bind_addr: env::var("BLOOM_BIND")
                .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
                .parse()
                .map_err(|_| {
                    Error::Configuration("BLOOM_BIND is not a valid socket address".to_string())
                })?,
        };

        if config.top_k == 0 {
            return Err(Error::Configuration(
                "BLOOM_TOP_K must be greater than 0".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(Error::Configuration(format!(
                "BLOOM_CHUNK_OVERLAP ({}) must be smaller than BLOOM_CHUNK_SIZE ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        Ok(config)
    }
}

fn parse_env(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Configuration(format!("{} is not a valid number: {}", key, raw))),
        Err(_) => Ok(default),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "bloom".to_string(),
            namespace: "course-catalogue".to_string(),
            docs_dir: PathBuf::from("docs"),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 4,
            embedding_dimension: 1536,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}
