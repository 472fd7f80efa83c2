use std::time::Duration;

use async_trait::async_trait;

use super::transport::{HttpMethod, OutboundRequest, Transport, TransportError, TransportResponse};
use super::RequestError;

/// Time allowed to establish a TCP/TLS connection. The overall per-attempt
/// deadline is enforced by `RequestClient`.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP transport backed by `reqwest`.
///
/// Carries no request timeout of its own: `RequestClient` drops the
/// in-flight future on expiry, which releases the connection.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RequestError::NetworkFailure(format!("HTTP client setup: {e}")))?;
        Ok(Self { client })
    }

    /// Use a preconfigured client (proxies, TLS roots, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

/// Builder errors (bad URL, header value or body) are not worth retrying.
fn classify(e: &reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::InvalidRequest(describe(e))
    } else {
        TransportError::Network(describe(e))
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_connect() {
        format!("connection failed: {e}")
    } else if e.is_timeout() {
        format!("connect timed out: {e}")
    } else {
        e.to_string()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(format!("reading body: {}", describe(&e))))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
