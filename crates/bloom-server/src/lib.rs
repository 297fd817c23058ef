//! HTTP chat API for the Bloom course advisor
//!
//! A thin axum layer over the retrieval chain: one chat endpoint returning
//! the complete answer as JSON, and a health probe. Token streaming is a
//! property of the terminal client; the HTTP surface replies once per
//! question.

mod server;

pub use server::{AppState, ChatRequest, router, serve};
