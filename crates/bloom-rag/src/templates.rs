//! Prompt templates for the retrieval chain
//!
//! Both templates are fixed string constants; the condense template rewrites
//! a follow-up question into a standalone one, and the answer template binds
//! the model to the retrieved catalogue context.

use bloom_core::ConversationTurn;

/// Rewrites a context-dependent follow-up into a standalone question so the
/// similarity search is not biased by pronouns or prior turns.
pub const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question.

Chat History:
{chat_history}
Follow Up Input: {question}
Standalone question:";

/// Course-advisor answer template. Instructs the model to answer only from
/// the retrieved context, to decline with a fixed phrase when no course
/// matches, and to quote prices in Euros.
pub const QA_TEMPLATE: &str = "You are a helpful AI course advisor. Your role is answer questions about the courses you have in the catalogue.
After you answer the question you can give courses advice for a course that you think match the best with the request of the learner. Course prices are in Euro's.
If you don't know a course that matches, just say; I do not know a course that fits your needs, we will add your request to the wishlist, to add this topic in the future. DO NOT try to make up a course.
You may answer questions about the courses in the courses document, for example the best rated course that you have or what courses are Instructor-led.
If the question is not related to the context, friendly respond that you are tuned to only answer questions that are related to the context.

{context}

Question: {question}
Helpful answer in markdown:";

/// Renders conversation history as alternating `Human:` / `Assistant:` lines,
/// strictly in submission order.
pub fn format_history(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_condense(question: &str, history: &[ConversationTurn]) -> String {
    CONDENSE_TEMPLATE
        .replace("{chat_history}", &format_history(history))
        .replace("{question}", question)
}

pub fn render_qa(question: &str, context: &str) -> String {
    QA_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}
