use async_trait::async_trait;

use super::demo::DemoBackend;
use super::ChatError;
use crate::client::{RequestClient, RequestError, RequestOptions};
use crate::config::ChatConfig;
use crate::models::{ChatReply, ChatRequest};

pub const CHAT_ENDPOINT: &str = "/api/chat";
pub const HEALTH_ENDPOINT: &str = "/health";

/// Whoever answers chat messages.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;

    /// True when the backend answers its health check.
    async fn health_check(&self) -> bool;

    fn is_demo(&self) -> bool {
        false
    }
}

/// Bot served over HTTP at `{base_url}/api/chat`.
#[derive(Clone)]
pub struct RemoteChatBackend {
    client: RequestClient,
}

impl RemoteChatBackend {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }
}

#[async_trait]
impl ChatBackend for RemoteChatBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let response = self
            .client
            .send(CHAT_ENDPOINT, request, RequestOptions::default())
            .await?;
        Ok(response.json::<ChatReply>()?)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(HEALTH_ENDPOINT, RequestOptions::default().max_attempts(1))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}

/// Connection indicator for the chat header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Connecting,
    Demo,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "🟢 Connected",
            ConnectionStatus::Disconnected => "🔴 Disconnected",
            ConnectionStatus::Connecting => "🟡 Connecting...",
            ConnectionStatus::Demo => "🔵 Demo Mode",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Check `backend` and report the indicator to show.
pub async fn connection_status(backend: &dyn ChatBackend) -> ConnectionStatus {
    if backend.is_demo() {
        return ConnectionStatus::Demo;
    }
    if backend.health_check().await {
        ConnectionStatus::Connected
    } else {
        ConnectionStatus::Disconnected
    }
}

/// Backend selected by configuration: the demo bot (thinking for
/// `chat.typing_delay`) when `api.demo_mode` is set, the HTTP backend
/// otherwise.
pub fn backend_for(config: &ChatConfig) -> Result<Box<dyn ChatBackend>, RequestError> {
    if config.api.demo_mode {
        tracing::info!("Using demo chat backend");
        return Ok(Box::new(DemoBackend::from_limits(&config.chat)));
    }
    tracing::info!(base_url = %config.api.base_url, "Using remote chat backend");
    Ok(Box::new(RemoteChatBackend::new(RequestClient::from_config(
        &config.api,
    )?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{
        ClientConfig, MockReply, MockTransport, SequentialIdGenerator, REQUEST_ID_HEADER,
    };
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn remote(transport: Arc<MockTransport>) -> RemoteChatBackend {
        RemoteChatBackend::new(RequestClient::new(
            transport,
            Arc::new(SequentialIdGenerator::new()),
            ClientConfig {
                base_url: "http://bot.test".into(),
                timeout: Duration::from_secs(30),
                max_attempts: 3,
                retry_delay: Duration::from_millis(1000),
            },
        ))
    }

    fn request() -> ChatRequest {
        ChatRequest {
            message: "hello".into(),
            conversation_id: "conv_1".into(),
            history: vec![],
            timestamp: "2024-03-14T15:07:00Z".into(),
        }
    }

    #[tokio::test]
    async fn posts_to_chat_endpoint() {
        let transport = Arc::new(MockTransport::always(MockReply::json(
            200,
            json!({ "reply": "Hi!", "messageId": "msg_9" }),
        )));
        let reply = remote(transport.clone()).send(&request()).await.unwrap();

        assert_eq!(reply.reply, "Hi!");
        assert_eq!(reply.message_id.as_deref(), Some("msg_9"));

        let call = &transport.calls()[0];
        assert_eq!(call.request.url, "http://bot.test/api/chat");
        assert!(call.request.header(REQUEST_ID_HEADER).is_some());
        assert_eq!(call.request.body.as_ref().unwrap()["message"], "hello");
    }

    #[tokio::test]
    async fn reply_without_text_is_malformed() {
        let transport = Arc::new(MockTransport::always(MockReply::json(200, json!({ "ok": 1 }))));
        let err = remote(transport).send(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Request(RequestError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn client_error_passes_through() {
        let transport = Arc::new(MockTransport::always(MockReply::status(400)));
        let err = remote(transport).send(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Request(RequestError::ClientError { status: 400, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn health_check_does_not_retry() {
        let transport = Arc::new(MockTransport::always(MockReply::status(503)));
        let backend = remote(transport.clone());

        assert!(!backend.health_check().await);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.calls()[0].request.url, "http://bot.test/health");
    }

    #[tokio::test]
    async fn connection_status_reflects_health() {
        let up = remote(Arc::new(MockTransport::always(MockReply::json(
            200,
            json!({ "status": "ok" }),
        ))));
        assert_eq!(connection_status(&up).await, ConnectionStatus::Connected);

        let down = remote(Arc::new(MockTransport::always(MockReply::network_error(
            "refused",
        ))));
        assert_eq!(connection_status(&down).await, ConnectionStatus::Disconnected);

        let demo = DemoBackend::instant();
        assert_eq!(connection_status(&demo).await, ConnectionStatus::Demo);
    }

    #[test]
    fn status_labels() {
        assert_eq!(ConnectionStatus::Demo.to_string(), "🔵 Demo Mode");
        assert_eq!(ConnectionStatus::Connecting.label(), "🟡 Connecting...");
    }

    #[test]
    fn backend_follows_demo_flag() {
        let mut config = ChatConfig::default();
        config.api.demo_mode = true;
        assert!(backend_for(&config).unwrap().is_demo());

        config.api.demo_mode = false;
        assert!(!backend_for(&config).unwrap().is_demo());
    }

    #[tokio::test(start_paused = true)]
    async fn demo_backend_uses_configured_typing_delay() {
        let mut config = ChatConfig::default();
        config.api.demo_mode = true;
        config.chat.typing_delay = Duration::from_millis(200);
        let backend = backend_for(&config).unwrap();

        let start = tokio::time::Instant::now();
        backend.send(&request()).await.unwrap();
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(200), "{waited:?}");
        assert!(waited < Duration::from_millis(600), "{waited:?}");
    }
}
