use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use bloom_core::{ChainResponse, ConversationTurn, Error};
use bloom_rag::ConversationalRetrievalChain;

#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<ConversationalRetrievalChain>,
}

/// Chat request body. History travels as `[question, answer]` pairs, oldest
/// first, exactly as the client accumulated them.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = match &error {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NoResults(_) => StatusCode::NOT_FOUND,
            Error::ExternalService(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChainResponse>, ApiError> {
    let history: Vec<ConversationTurn> = request
        .history
        .into_iter()
        .map(ConversationTurn::from)
        .collect();

    tracing::info!(
        "chat question ({} history turns): {}",
        history.len(),
        request.question
    );

    let response = state.chain.ask(&request.question, &history).await?;
    Ok(Json(response))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use bloom_core::{
        EmbeddingProvider, LLMProvider, Result, SourceDocument, VectorEntry, VectorStore,
    };
    use bloom_rag::ChainOptions;

    struct CannedLlm;

    #[async_trait]
    impl LLMProvider for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok("Intro to Go fits you.".to_string())
        }

        async fn complete_stream(
            &self,
            prompt: &str,
            _tokens: mpsc::Sender<String>,
        ) -> Result<String> {
            self.complete(prompt).await
        }

        fn model_id(&self) -> &str {
            "canned"
        }
    }

    struct ZeroEmbedder;

    #[async_trait]
    impl EmbeddingProvider for ZeroEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 4]).collect())
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    struct SingleDocStore;

    #[async_trait]
    impl VectorStore for SingleDocStore {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn upsert(&self, _namespace: &str, _entries: Vec<VectorEntry>) -> Result<()> {
            Ok(())
        }

        async fn similarity_search(
            &self,
            _namespace: &str,
            _vector: Vec<f32>,
            _top_k: usize,
        ) -> Result<Vec<SourceDocument>> {
            Ok(vec![SourceDocument {
                page_content: "title: Intro to Go".to_string(),
                metadata: serde_json::json!({"source": "docs/catalogue.csv", "row": 1}),
            }])
        }

        async fn count(&self, _namespace: &str) -> Result<usize> {
            Ok(1)
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn test_router() -> Router {
        let chain = ConversationalRetrievalChain::new(
            Arc::new(CannedLlm),
            Arc::new(ZeroEmbedder),
            Arc::new(SingleDocStore),
            ChainOptions::new("course-catalogue", 4).unwrap(),
        );
        router(AppState {
            chain: Arc::new(chain),
        })
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn chat_request(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn chat_returns_answer_and_sources() {
        let response = test_router()
            .oneshot(chat_request(&json!({
                "question": "any Go courses?",
                "history": [["hello", "Hi, how can I help?"]],
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["text"], "Intro to Go fits you.");
        assert_eq!(body["sourceDocuments"][0]["pageContent"], "title: Intro to Go");
    }

    #[tokio::test]
    async fn missing_history_defaults_to_empty() {
        let response = test_router()
            .oneshot(chat_request(&json!({ "question": "any Go courses?" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn blank_question_is_a_bad_request() {
        let response = test_router()
            .oneshot(chat_request(&json!({ "question": "   " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("question"));
    }

    #[tokio::test]
    async fn health_probe_is_ok() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }
}
