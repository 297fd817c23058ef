//! Conversational retrieval chain
//!
//! Two LLM passes per question: an optional condense pass that rewrites a
//! follow-up into a standalone question, then an answer pass grounded in the
//! chunks retrieved for that standalone question. Provider failures are
//! logged in full but surface to callers as one generic message, so internal
//! endpoints and error details never reach the chat surface.

use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use tokio::sync::mpsc;

use bloom_core::{
    ChainEvent, ChainResponse, ConversationTurn, EmbeddingProvider, Error, LLMProvider, Result,
    SourceDocument, VectorStore,
};

use crate::templates;

/// Message shown to users whenever a provider call fails mid-chain.
pub const GENERIC_FAILURE: &str =
    "Something went wrong while answering your question. Please try again.";

#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub namespace: String,
    pub top_k: usize,
}

impl ChainOptions {
    pub fn new(namespace: impl Into<String>, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::Validation(
                "top_k must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            namespace: namespace.into(),
            top_k,
        })
    }
}

pub struct ConversationalRetrievalChain {
    llm: Arc<dyn LLMProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    options: ChainOptions,
}

impl ConversationalRetrievalChain {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        options: ChainOptions,
    ) -> Self {
        Self {
            llm,
            embedder,
            store,
            options,
        }
    }

    /// Answer a question in one shot, without token streaming.
    pub async fn ask(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<ChainResponse> {
        let question = normalize_question(question)?;
        let standalone = self.condense(&question, history).await?;
        let sources = self.retrieve(&standalone).await?;

        let prompt = templates::render_qa(&standalone, &join_context(&sources));
        let answer = self.llm.complete(&prompt).await.map_err(opaque)?;

        Ok(ChainResponse {
            text: sanitize_model_output(&answer),
            source_documents: sources,
        })
    }

    /// Answer a question, forwarding answer tokens as they arrive. The final
    /// `ChainEvent::Done` carries the full sanitized response; condense-pass
    /// output is never streamed.
    pub async fn ask_stream(
        &self,
        question: &str,
        history: &[ConversationTurn],
        events: mpsc::Sender<ChainEvent>,
    ) -> Result<ChainResponse> {
        let question = normalize_question(question)?;
        let standalone = self.condense(&question, history).await?;
        let sources = self.retrieve(&standalone).await?;

        let prompt = templates::render_qa(&standalone, &join_context(&sources));

        let (tokens_tx, mut tokens_rx) = mpsc::channel::<String>(32);
        let forward_to = events.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(token) = tokens_rx.recv().await {
                if forward_to.send(ChainEvent::Token(token)).await.is_err() {
                    // Caller hung up. Dropping the receiver closes the
                    // channel, which tells the provider to abandon the
                    // in-flight stream.
                    break;
                }
            }
        });

        let answer = self.llm.complete_stream(&prompt, tokens_tx).await;
        let _ = forwarder.await;
        let answer = answer.map_err(opaque)?;

        let response = ChainResponse {
            text: sanitize_model_output(&answer),
            source_documents: sources,
        };
        let _ = events.send(ChainEvent::Done(response.clone())).await;

        Ok(response)
    }

    // With no history the question is already standalone and the condense
    // pass is skipped entirely.
    async fn condense(&self, question: &str, history: &[ConversationTurn]) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = templates::render_condense(question, history);
        let standalone = self.llm.complete(&prompt).await.map_err(opaque)?;
        let standalone = standalone.trim();

        tracing::debug!("condensed follow-up into: {}", standalone);

        if standalone.is_empty() {
            // Model produced nothing usable; fall back to the raw question.
            Ok(question.to_string())
        } else {
            Ok(standalone.to_string())
        }
    }

    async fn retrieve(&self, standalone: &str) -> Result<Vec<SourceDocument>> {
        let vector = self.embedder.embed_query(standalone).await.map_err(opaque)?;
        let sources = self
            .store
            .similarity_search(&self.options.namespace, vector, self.options.top_k)
            .await
            .map_err(opaque)?;

        tracing::debug!("retrieved {} source documents", sources.len());
        Ok(sources)
    }
}

fn normalize_question(question: &str) -> Result<String> {
    // Embedded newlines skew the similarity search.
    let normalized = question.trim().replace('\n', " ");
    if normalized.is_empty() {
        return Err(Error::Validation("question must not be empty".to_string()));
    }
    Ok(normalized)
}

fn join_context(sources: &[SourceDocument]) -> String {
    sources
        .iter()
        .map(|doc| doc.page_content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn opaque(cause: Error) -> Error {
    tracing::error!("chain step failed: {}", cause);
    Error::ExternalService(GENERIC_FAILURE.to_string())
}

static FENCED_OUTPUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\n(.*?)\n?```$").unwrap());

/// Strip a code fence the model sometimes wraps its whole answer in, keeping
/// fences that appear inside the answer body untouched.
pub fn sanitize_model_output(raw: &str) -> String {
    let trimmed = raw.trim();
    match FENCED_OUTPUT.captures(trimmed) {
        Some(captures) => captures[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}
