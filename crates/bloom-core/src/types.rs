//! Data model for catalogue ingestion and the chat flow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw row of a catalogue source file. Read once at ingestion time and
/// immediately rendered into a [`RawDocument`]; never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogueRecord {
    #[serde(alias = "Title", alias = "course_title")]
    pub title: String,
    #[serde(alias = "Description")]
    pub description: String,
    #[serde(alias = "Rating")]
    pub rating: String,
    #[serde(alias = "Price")]
    pub price: String,
    #[serde(
        alias = "delivery mode",
        alias = "Delivery Mode",
        alias = "delivery_mode"
    )]
    pub delivery_mode: String,
}

impl CatalogueRecord {
    /// Renders the record as `header: value` lines, one per field, matching
    /// the page content a generic CSV loader would produce.
    pub fn to_page_content(&self) -> String {
        format!(
            "title: {}\ndescription: {}\nrating: {}\nprice: {}\ndelivery mode: {}",
            self.title, self.description, self.rating, self.price, self.delivery_mode
        )
    }
}

/// A loaded source document: full text plus provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub page_content: String,
    pub metadata: serde_json::Value,
}

/// A bounded text span produced by the splitter. Has no identity of its own;
/// once upserted it lives under the vector id derived from its content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub page_content: String,
    pub metadata: serde_json::Value,
}

/// A retrieved document returned alongside an answer. Field names follow the
/// wire contract of the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDocument {
    pub page_content: String,
    pub metadata: serde_json::Value,
}

/// A completed (question, answer) pair. The ordered sequence of turns forms
/// the conversation history the client sends back on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl From<(String, String)> for ConversationTurn {
    fn from((question, answer): (String, String)) -> Self {
        Self { question, answer }
    }
}

impl From<ConversationTurn> for (String, String) {
    fn from(turn: ConversationTurn) -> (String, String) {
        (turn.question, turn.answer)
    }
}

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// UI-facing message unit, appended to the session's append-only list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_documents: Vec<SourceDocument>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            source_documents: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, source_documents: Vec<SourceDocument>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            source_documents,
            created_at: Utc::now(),
        }
    }
}

/// Final result of one query-pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainResponse {
    pub text: String,
    pub source_documents: Vec<SourceDocument>,
}

/// One event on the streaming channel: text fragments in generation order,
/// terminated by a completion marker carrying the full answer and the
/// retrieved source documents.
#[derive(Debug, Clone)]
pub enum ChainEvent {
    Token(String),
    Done(ChainResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_record_renders_header_value_lines() {
        let record = CatalogueRecord {
            title: "Intro to Go".to_string(),
            description: "A first course on Go".to_string(),
            rating: "4.5".to_string(),
            price: "49".to_string(),
            delivery_mode: "Self-paced".to_string(),
        };

        let content = record.to_page_content();
        assert!(content.contains("title: Intro to Go"));
        assert!(content.contains("price: 49"));
        assert!(content.contains("delivery mode: Self-paced"));
    }

    #[test]
    fn source_document_uses_wire_field_names() {
        let doc = SourceDocument {
            page_content: "title: Intro to Go".to_string(),
            metadata: serde_json::json!({"source": "docs/catalogue.csv", "row": 1}),
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("pageContent").is_some());
        assert!(json.get("metadata").is_some());
    }

    #[test]
    fn chain_response_serializes_source_documents_key() {
        let response = ChainResponse {
            text: "answer".to_string(),
            source_documents: vec![],
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("sourceDocuments").is_some());
    }

    #[test]
    fn conversation_turn_round_trips_through_pairs() {
        let turn: ConversationTurn =
            ("what courses teach Go?".to_string(), "Intro to Go".to_string()).into();
        assert_eq!(turn.question, "what courses teach Go?");

        let (question, answer): (String, String) = turn.into();
        assert_eq!(question, "what courses teach Go?");
        assert_eq!(answer, "Intro to Go");
    }
}
