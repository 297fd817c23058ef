//! Qdrant-backed vector store
//!
//! One collection holds every namespace; entries carry a `namespace` payload
//! field and searches filter on it, which maps managed-index namespaces onto
//! a single Qdrant collection.

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::HashMap;

use bloom_core::{Error, Result, SourceDocument, VectorEntry, VectorStore};

pub struct QdrantVectorStore {
    url: String,
    collection: String,
    dimension: usize,
    client: Option<Qdrant>,
}

impl QdrantVectorStore {
    pub fn new(url: impl Into<String>, collection: impl Into<String>, dimension: usize) -> Self {
        Self {
            url: url.into(),
            collection: collection.into(),
            dimension,
            client: None,
        }
    }

    fn client(&self) -> Result<&Qdrant> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::VectorStore("not connected. Call connect() first.".to_string()))
    }

    fn namespace_filter(namespace: &str) -> Filter {
        Filter::must([Condition::matches("namespace", namespace.to_string())])
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn connect(&mut self) -> Result<()> {
        let client = Qdrant::from_url(&self.url)
            .build()
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        let exists = client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        if !exists {
            client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| Error::VectorStore(e.to_string()))?;
            tracing::info!("created collection {}", self.collection);
        }

        self.client = Some(client);
        Ok(())
    }

    async fn upsert(&self, namespace: &str, entries: Vec<VectorEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = entries
            .into_iter()
            .map(|entry| {
                let mut payload = Payload::new();
                payload.insert("text", entry.page_content);
                payload.insert("namespace", namespace.to_string());
                // Arbitrary metadata travels as a JSON string so nothing is
                // lost between serde_json and the payload model.
                payload.insert("metadata", entry.metadata.to_string());
                PointStruct::new(entry.id, entry.vector, payload)
            })
            .collect();

        self.client()?
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        Ok(())
    }

    async fn similarity_search(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<SourceDocument>> {
        let response = self
            .client()?
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, top_k as u64)
                    .filter(Self::namespace_filter(namespace))
                    .with_payload(true),
            )
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        let documents = response
            .result
            .into_iter()
            .map(|point| {
                let page_content = payload_str(&point.payload, "text").unwrap_or_default();
                let metadata = payload_str(&point.payload, "metadata")
                    .and_then(|raw| serde_json::from_str(&raw).ok())
                    .unwrap_or(serde_json::Value::Null);
                SourceDocument {
                    page_content,
                    metadata,
                }
            })
            .collect();

        Ok(documents)
    }

    async fn count(&self, namespace: &str) -> Result<usize> {
        let response = self
            .client()?
            .count(
                CountPointsBuilder::new(&self.collection)
                    .filter(Self::namespace_filter(namespace))
                    .exact(true),
            )
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)?.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconnected_store_reports_disconnected() {
        let store = QdrantVectorStore::new("http://localhost:6334", "bloom", 1536);
        assert!(!store.is_connected());
        assert!(store.client().is_err());
    }

    #[test]
    fn payload_strings_are_extracted_by_kind() {
        let mut payload = HashMap::new();
        payload.insert(
            "text".to_string(),
            Value {
                kind: Some(Kind::StringValue("title: Intro to Go".to_string())),
            },
        );
        payload.insert(
            "score".to_string(),
            Value {
                kind: Some(Kind::DoubleValue(0.9)),
            },
        );

        assert_eq!(
            payload_str(&payload, "text").as_deref(),
            Some("title: Intro to Go")
        );
        assert!(payload_str(&payload, "score").is_none());
        assert!(payload_str(&payload, "missing").is_none());
    }
}
