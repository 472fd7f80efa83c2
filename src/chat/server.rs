//! Demo bot over HTTP.
//!
//! Serves the same contract `RemoteChatBackend` speaks:
//! - `POST /api/chat` takes a `ChatRequest`, answers a `ChatReply`
//! - `GET /health` reports the server up
//!
//! Mount the returned `Router` on any axum server.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use super::backend::{ChatBackend, CHAT_ENDPOINT, HEALTH_ENDPOINT};
use super::demo::{DemoBackend, DEMO_MODEL};
use crate::config::{APP_NAME, APP_VERSION};
use crate::models::{ChatReply, ChatRequest};

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DemoApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for DemoApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            DemoApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            DemoApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Demo server internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for DemoApiError {
    fn from(rejection: JsonRejection) -> Self {
        DemoApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub model: &'static str,
}

/// Router answering chat requests with `backend`.
pub fn demo_router(backend: Arc<DemoBackend>) -> Router {
    Router::new()
        .route(CHAT_ENDPOINT, post(chat))
        .route(HEALTH_ENDPOINT, get(health))
        .with_state(backend)
}

async fn chat(
    State(backend): State<Arc<DemoBackend>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, DemoApiError> {
    let Json(request) = payload?;
    if request.message.trim().is_empty() {
        return Err(DemoApiError::BadRequest("message must not be empty".into()));
    }

    let reply = backend
        .send(&request)
        .await
        .map_err(|e| DemoApiError::Internal(e.to_string()))?;
    Ok(Json(reply))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: APP_NAME,
        version: APP_VERSION,
        model: DEMO_MODEL,
    })
}
