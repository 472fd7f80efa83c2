use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::http::ReqwestTransport;
use super::ids::{IdGenerator, TimestampIdGenerator, REQUEST_ID_PREFIX};
use super::transport::{
    HttpMethod, OutboundRequest, Transport, TransportError, TransportResponse, CONTENT_TYPE_JSON,
    REQUEST_ID_HEADER,
};
use super::RequestError;
use crate::config::ApiConfig;

/// Client-wide defaults. Individual calls may override timeout and attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Total attempts per call, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Linear backoff unit.
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ClientConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            timeout: api.timeout,
            max_attempts: api.retry_attempts,
            retry_delay: api.retry_delay,
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<HttpMethod>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
}

impl RequestOptions {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }
}

/// Record of one attempt within a logical send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestAttempt {
    pub request_id: String,
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
}

/// Successful reply: 2xx status and a JSON body, passed through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub request_id: String,
    pub status: u16,
    pub body: serde_json::Value,
    pub attempts: Vec<RequestAttempt>,
}

impl Response {
    /// Decode the body into an application type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        T::deserialize(&self.body).map_err(|e| RequestError::MalformedResponse(e.to_string()))
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }
}

/// Progress of one logical send.
///
/// `Attempting(n) -> Success | RetryWait(n) -> Attempting(n + 1) | Failed`
#[derive(Debug)]
enum SendState {
    Attempting(u32),
    RetryWait { attempt: u32, error: RequestError },
    Success(TransportResponse),
    Failed(RequestError),
}

/// Sends JSON requests with a correlation id, per-attempt timeout and
/// linear-backoff retries.
#[derive(Clone)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    ids: Arc<dyn IdGenerator>,
    config: ClientConfig,
}

impl RequestClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        ids: Arc<dyn IdGenerator>,
        config: ClientConfig,
    ) -> Self {
        Self {
            transport,
            ids,
            config: ClientConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
        }
    }

    /// Production client: reqwest transport and timestamp ids.
    pub fn from_config(api: &ApiConfig) -> Result<Self, RequestError> {
        Ok(Self::new(
            Arc::new(ReqwestTransport::new()?),
            Arc::new(TimestampIdGenerator),
            ClientConfig::from(api),
        ))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URLs pass through; paths are joined to the base URL.
    pub fn url_for(&self, target: &str) -> String {
        let lower = target.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return target.to_string();
        }
        if target.starts_with('/') {
            format!("{}{}", self.config.base_url, target)
        } else {
            format!("{}/{}", self.config.base_url, target)
        }
    }

    /// Send `payload` as JSON (POST unless the options say otherwise).
    pub async fn send<P: Serialize + ?Sized>(
        &self,
        target: &str,
        payload: &P,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| RequestError::InvalidRequest(format!("payload not serializable: {e}")))?;
        self.dispatch(target, Some(body), HttpMethod::Post, options)
            .await
    }

    /// Bodiless request (GET unless the options say otherwise).
    pub async fn get(&self, target: &str, options: RequestOptions) -> Result<Response, RequestError> {
        self.dispatch(target, None, HttpMethod::Get, options).await
    }

    async fn dispatch(
        &self,
        target: &str,
        body: Option<serde_json::Value>,
        default_method: HttpMethod,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        let request_id = self.ids.generate(REQUEST_ID_PREFIX);
        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let max_attempts = options
            .max_attempts
            .unwrap_or(self.config.max_attempts)
            .max(1);

        let mut headers = vec![
            ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
            (REQUEST_ID_HEADER.to_string(), request_id.clone()),
        ];
        headers.extend(options.headers);

        let request = OutboundRequest {
            method: options.method.unwrap_or(default_method),
            url: self.url_for(target),
            headers,
            body,
        };

        let mut attempts = Vec::new();
        let mut state = SendState::Attempting(1);
        loop {
            state = match state {
                SendState::Attempting(n) => {
                    attempts.push(RequestAttempt {
                        request_id: request_id.clone(),
                        attempt_number: n,
                        started_at: Utc::now(),
                    });
                    tracing::debug!(
                        request_id = %request_id,
                        attempt = n,
                        method = request.method.as_str(),
                        url = %request.url,
                        "Sending request"
                    );

                    match self.attempt(&request, timeout).await {
                        Ok(response) => SendState::Success(response),
                        Err(e) if e.is_retryable() && n < max_attempts => SendState::RetryWait {
                            attempt: n,
                            error: e,
                        },
                        Err(e) if e.is_retryable() => SendState::Failed(RequestError::RetriesExhausted {
                            attempts: n,
                            last: Box::new(e),
                        }),
                        Err(e) => SendState::Failed(e),
                    }
                }
                SendState::RetryWait { attempt, error } => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        request_id = %request_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    SendState::Attempting(attempt + 1)
                }
                SendState::Success(response) => match parse_body(&response.body) {
                    Ok(body) => {
                        tracing::debug!(
                            request_id = %request_id,
                            status = response.status,
                            attempts = attempts.len(),
                            "Request succeeded"
                        );
                        return Ok(Response {
                            request_id,
                            status: response.status,
                            body,
                            attempts,
                        });
                    }
                    Err(e) => SendState::Failed(e),
                },
                SendState::Failed(error) => {
                    tracing::error!(
                        request_id = %request_id,
                        attempts = attempts.len(),
                        error = %error,
                        "Request failed"
                    );
                    return Err(error);
                }
            };
        }
    }

    /// One bounded attempt. On timeout the transport future is dropped, so a
    /// late reply can never be observed.
    async fn attempt(
        &self,
        request: &OutboundRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, RequestError> {
        let response = match tokio::time::timeout(timeout, self.transport.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(TransportError::Network(message))) => {
                return Err(RequestError::NetworkFailure(message))
            }
            Ok(Err(TransportError::InvalidRequest(message))) => {
                return Err(RequestError::InvalidRequest(message))
            }
            Err(_) => return Err(RequestError::Timeout { after: timeout }),
        };

        if response.is_success() {
            Ok(response)
        } else {
            Err(RequestError::from_status(response.status, &response.status_text))
        }
    }

    /// Wait after failed attempt `attempt` (1-indexed). Saturates instead of
    /// overflowing.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.config
            .retry_delay
            .checked_mul(attempt)
            .unwrap_or(Duration::MAX)
    }
}

fn parse_body(body: &str) -> Result<serde_json::Value, RequestError> {
    if body.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(body).map_err(|e| RequestError::MalformedResponse(e.to_string()))
}
