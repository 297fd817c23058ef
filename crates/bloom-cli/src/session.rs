//! Chat session state machine
//!
//! States: idle, submitting. A turn begins with a non-empty question, holds
//! the session in `submitting` until the chain answers or fails, and ends
//! back in idle. Source documents already shown in earlier turns are
//! filtered out of each new answer; a turn whose sources are all repeats is
//! reported as `NothingNew`, which is a notice, not a failure, and like a
//! failure it does not extend the history sent on later requests.

use std::collections::HashSet;

use bloom_core::{ChainResponse, ChatMessage, ConversationTurn, Error, Result};

/// Opening message shown before the first question.
pub const GREETING: &str = "Hi, I am Bloom, your course advisor. What would you like to learn about?";

/// Notice for a turn that only repeated already-shown courses.
pub const NO_NEW_RECOMMENDATIONS: &str = "No new unique course recommendations for this question.";

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Answer accepted: message appended, history extended.
    Answered(ChatMessage),
    /// The model answered, but every cited source was already shown.
    NothingNew,
    /// The turn failed; the user must resubmit manually.
    Failed(String),
}

pub struct ChatSession {
    messages: Vec<ChatMessage>,
    history: Vec<ConversationTurn>,
    seen_sources: HashSet<String>,
    pending: Option<String>,
    error: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING, Vec::new())],
            history: Vec::new(),
            seen_sources: HashSet::new(),
            pending: None,
            error: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Turns accumulated so far, in submission order. This is what every
    /// request carries; nothing is ever reordered, truncated, or duplicated.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Begin a turn. Rejects blank input and concurrent submissions without
    /// touching messages or history; on success the user message is appended
    /// optimistically and the trimmed question is returned for the chain.
    pub fn begin(&mut self, input: &str) -> Result<String> {
        if self.pending.is_some() {
            return Err(Error::Validation(
                "a question is already being answered".to_string(),
            ));
        }

        let question = input.trim().to_string();
        if question.is_empty() {
            return Err(Error::Validation("please enter a question".to_string()));
        }

        self.error = None;
        self.messages.push(ChatMessage::user(&question));
        self.pending = Some(question.clone());
        Ok(question)
    }

    /// Finish the in-flight turn with the chain's response.
    pub fn complete(&mut self, response: ChainResponse) -> TurnOutcome {
        let Some(question) = self.pending.take() else {
            return TurnOutcome::Failed("no question in flight".to_string());
        };

        let had_sources = !response.source_documents.is_empty();
        let new_sources: Vec<_> = response
            .source_documents
            .into_iter()
            .filter(|doc| !self.seen_sources.contains(&doc.page_content))
            .collect();

        // A sourceless answer is a normal answer; only a batch made entirely
        // of repeats counts as nothing new.
        if had_sources && new_sources.is_empty() {
            return TurnOutcome::NothingNew;
        }

        for doc in &new_sources {
            self.seen_sources.insert(doc.page_content.clone());
        }

        let message = ChatMessage::assistant(&response.text, new_sources);
        self.messages.push(message.clone());
        self.history.push(ConversationTurn {
            question,
            answer: response.text,
        });

        TurnOutcome::Answered(message)
    }

    /// Finish the in-flight turn with a failure. History is untouched and
    /// the error is kept for display until the next submission.
    pub fn fail(&mut self, message: impl Into<String>) -> TurnOutcome {
        self.pending = None;
        let message = message.into();
        self.error = Some(message.clone());
        TurnOutcome::Failed(message)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_core::{Role, SourceDocument};

    fn doc(content: &str) -> SourceDocument {
        SourceDocument {
            page_content: content.to_string(),
            metadata: serde_json::json!({"source": "docs/catalogue.csv"}),
        }
    }

    fn response(text: &str, sources: &[&str]) -> ChainResponse {
        ChainResponse {
            text: text.to_string(),
            source_documents: sources.iter().map(|s| doc(s)).collect(),
        }
    }

    #[test]
    fn starts_with_the_greeting_only() {
        let session = ChatSession::new();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::Assistant);
        assert_eq!(session.messages()[0].text, GREETING);
        assert!(session.history().is_empty());
    }

    #[test]
    fn blank_input_never_mutates_the_session() {
        let mut session = ChatSession::new();
        assert!(session.begin("   \n ").is_err());
        assert_eq!(session.messages().len(), 1);
        assert!(session.history().is_empty());
        assert!(!session.is_submitting());
    }

    #[test]
    fn only_one_submission_may_be_in_flight() {
        let mut session = ChatSession::new();
        session.begin("any Go courses?").unwrap();
        assert!(session.is_submitting());
        assert!(session.begin("another question").is_err());
        // The rejected submission must not appear as a user message.
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn answered_turns_extend_history_in_order() {
        let mut session = ChatSession::new();

        session.begin("any Go courses?").unwrap();
        let outcome = session.complete(response("Intro to Go fits.", &["title: Intro to Go"]));
        assert!(matches!(outcome, TurnOutcome::Answered(_)));

        session.begin("anything on Rust?").unwrap();
        session.complete(response("Advanced Rust fits.", &["title: Advanced Rust"]));

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "any Go courses?");
        assert_eq!(history[0].answer, "Intro to Go fits.");
        assert_eq!(history[1].question, "anything on Rust?");
    }

    #[test]
    fn repeated_sources_yield_nothing_new_and_no_history_entry() {
        let mut session = ChatSession::new();

        session.begin("any Go courses?").unwrap();
        session.complete(response("Intro to Go fits.", &["title: Intro to Go"]));

        session.begin("what about Go again?").unwrap();
        let outcome = session.complete(response("Still Intro to Go.", &["title: Intro to Go"]));

        assert_eq!(outcome, TurnOutcome::NothingNew);
        assert_eq!(session.history().len(), 1);
        // Greeting, two user messages, one assistant answer; the repeat
        // answer is not shown.
        assert_eq!(session.messages().len(), 4);
        assert!(!session.is_submitting());
    }

    #[test]
    fn already_shown_sources_are_filtered_from_new_answers() {
        let mut session = ChatSession::new();

        session.begin("any Go courses?").unwrap();
        session.complete(response("Intro to Go fits.", &["title: Intro to Go"]));

        session.begin("Go or Rust?").unwrap();
        let outcome = session.complete(response(
            "Both have options.",
            &["title: Intro to Go", "title: Advanced Rust"],
        ));

        match outcome {
            TurnOutcome::Answered(message) => {
                assert_eq!(message.source_documents.len(), 1);
                assert_eq!(message.source_documents[0].page_content, "title: Advanced Rust");
            }
            other => panic!("expected Answered, got {:?}", other),
        }
    }

    #[test]
    fn first_turn_with_no_sources_is_still_an_answer() {
        let mut session = ChatSession::new();
        session.begin("hello there").unwrap();
        let outcome = session.complete(response("Hi! Ask me about courses.", &[]));
        assert!(matches!(outcome, TurnOutcome::Answered(_)));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn failures_keep_history_untouched_and_store_the_error() {
        let mut session = ChatSession::new();
        session.begin("any Go courses?").unwrap();

        let outcome = session.fail("Something went wrong. Please try again.");
        assert!(matches!(outcome, TurnOutcome::Failed(_)));
        assert!(session.history().is_empty());
        assert_eq!(
            session.last_error(),
            Some("Something went wrong. Please try again.")
        );
        assert!(!session.is_submitting());

        // The next successful begin clears the error.
        session.begin("retry please").unwrap();
        assert!(session.last_error().is_none());
    }
}
