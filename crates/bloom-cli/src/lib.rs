//! Terminal chat session and UI for Bloom
//!
//! `session` holds the chat state machine, independent of any rendering;
//! `ui` is the crossterm/colored surface that drives it.

pub mod session;
pub mod ui;

pub use session::{ChatSession, TurnOutcome};
