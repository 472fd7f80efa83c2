//! Chat thread state and bot backends.
//!
//! - `ChatSession` owns the message thread, the conversation id and the
//!   "awaiting reply" guard; the caller owns the session.
//! - `ChatBackend` is the seam to whoever answers: `RemoteChatBackend` over
//!   HTTP, or `DemoBackend` with canned replies.
//! - `server::demo_router` serves the demo bot over HTTP.

pub mod backend;
pub mod demo;
pub mod history;
pub mod responses;
pub mod server;
pub mod session;

pub use backend::*;
pub use demo::*;
pub use history::*;
pub use session::*;

use thiserror::Error;

use crate::client::RequestError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message is too long ({length} characters, limit {limit})")]
    MessageTooLong { length: usize, limit: usize },

    #[error("A reply is already pending")]
    ReplyPending,

    #[error("Reply arrived for a conversation that has been cleared")]
    StaleReply,

    #[error("Request failed: {0}")]
    Request(#[from] RequestError),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl ChatError {
    /// Text safe to show in the thread instead of raw error details.
    pub fn user_message(&self) -> &'static str {
        match self {
            ChatError::Request(e) => e.user_message(),
            _ => "Sorry, I couldn't process your message. Please try again.",
        }
    }
}

// ═══════════════════════════════════════════
// Title generation
// ═══════════════════════════════════════════

const TITLE_MAX_CHARS: usize = 50;

/// Conversation title from the first user message.
/// Cut at 50 characters with "..." if longer, on a char boundary.
pub fn generate_title(first_message: &str) -> String {
    let trimmed = first_message.trim();
    if trimmed.is_empty() {
        return "New conversation".to_string();
    }

    match trimmed.char_indices().nth(TITLE_MAX_CHARS) {
        Some((boundary, _)) => format!("{}...", &trimmed[..boundary]),
        None => trimmed.to_string(),
    }
}
