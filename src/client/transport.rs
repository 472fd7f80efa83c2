use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// One fully-built HTTP call, reused unchanged across retries.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl OutboundRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response as seen on the wire, before status classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Nothing usable came back from the exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connect, TLS or read failure.
    #[error("{0}")]
    Network(String),

    /// The request could not be built (URL, header value, body).
    /// Sending it again cannot succeed.
    #[error("request not sendable: {0}")]
    InvalidRequest(String),
}

/// Executes a single HTTP exchange. Retries and timeouts live above this.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// Canonical reason phrase for a status code, empty when unknown.
pub fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

// ═══════════════════════════════════════════
// Scripted transport
// ═══════════════════════════════════════════

/// One scripted outcome, optionally delayed.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub delay: Duration,
    pub outcome: Result<TransportResponse, TransportError>,
}

impl MockReply {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self::raw(status, &body.to_string())
    }

    pub fn status(status: u16) -> Self {
        Self::raw(status, "")
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(TransportResponse::new(status, body)),
        }
    }

    pub fn network_error(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(TransportError::Network(message.to_string())),
        }
    }

    pub fn invalid_request(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(TransportError::InvalidRequest(message.to_string())),
        }
    }

    /// Deliver this outcome only after `delay`.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A call seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: OutboundRequest,
    pub at: tokio::time::Instant,
}

/// Transport replaying a script of replies, for tests and offline demos.
/// The last reply repeats once the script runs out.
pub struct MockTransport {
    script: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    pub fn new(script: Vec<MockReply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: MockReply) -> Self {
        Self::new(vec![reply])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn next_reply(&self) -> MockReply {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        next.unwrap_or_else(|| MockReply::network_error("no scripted reply"))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                request: request.clone(),
                at: tokio::time::Instant::now(),
            });

        let reply = self.next_reply();
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.outcome
    }
}
