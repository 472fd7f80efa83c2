//! Outbound requests to the bot backend.
//!
//! `RequestClient` tags every call with a correlation id, bounds each attempt
//! with a hard timeout and retries transient failures with linear backoff.
//! The wire is behind the `Transport` trait so tests can script responses.

pub mod http;
pub mod ids;
pub mod request;
pub mod transport;

pub use http::*;
pub use ids::*;
pub use request::*;
pub use transport::*;

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Client error (status {status}): {status_text}")]
    ClientError { status: u16, status_text: String },

    #[error("Server error (status {status}): {status_text}")]
    ServerError { status: u16, status_text: String },

    #[error("Unexpected status {status}: {status_text}")]
    UnexpectedStatus { status: u16, status_text: String },

    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<RequestError>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl RequestError {
    /// Classify a non-2xx status. 500–599 is a server error, 400–499 a
    /// client error, anything else unexpected.
    pub fn from_status(status: u16, status_text: &str) -> Self {
        let status_text = status_text.to_string();
        match status {
            500..=599 => RequestError::ServerError {
                status,
                status_text,
            },
            400..=499 => RequestError::ClientError {
                status,
                status_text,
            },
            _ => RequestError::UnexpectedStatus {
                status,
                status_text,
            },
        }
    }

    /// Network-level failures and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RequestError::NetworkFailure(_) | RequestError::ServerError { .. }
        )
    }

    /// HTTP status behind this error, looking through `RetriesExhausted`.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::ClientError { status, .. }
            | RequestError::ServerError { status, .. }
            | RequestError::UnexpectedStatus { status, .. } => Some(*status),
            RequestError::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    /// Text safe to show in the chat thread instead of raw error details.
    pub fn user_message(&self) -> &'static str {
        match self {
            RequestError::Timeout { .. } => {
                "The response is taking too long. Please try again in a moment."
            }
            RequestError::NetworkFailure(_)
            | RequestError::ServerError { .. }
            | RequestError::RetriesExhausted { .. } => {
                "I'm experiencing some technical difficulties. Please try again in a moment."
            }
            _ => "Sorry, I couldn't process your message. Please try again.",
        }
    }
}
