//! Reqwest transport implementation.

use std::sync::Arc;
use std::time::Instant;

use erlene_integration::{
    HttpMethod, HttpTransport, TransportError, TransportRequest, TransportResponse,
};
use reqwest::{Client, Method};

use crate::config::ReqwestConfig;
use crate::error::Result;

/// Tracing target for transport operations.
pub const TRACING_TARGET: &str = "erlene_reqwest::transport";

/// Inner transport that holds the HTTP client and configuration.
struct ReqwestTransportInner {
    http: Client,
    config: ReqwestConfig,
}

/// HTTP transport for the integration gateway.
///
/// Returns every response it receives, whatever the status; only failures
/// to obtain a response are reported as [`TransportError`]s.
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Creates a new transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            user_agent = %user_agent,
            "Creating reqwest transport"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()?;

        let inner = ReqwestTransportInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Creates a new transport with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ReqwestConfig::default())
    }

    /// Gets the transport configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    fn build(&self, request: &TransportRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .http
            .request(to_method(request.method), request.url.as_str())
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(query) = request.query() {
            builder = builder.query(query);
        }

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        builder
    }

    async fn dispatch(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let response = self.build(request).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(TransportResponse::new(status, body))
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let started_at = Instant::now();

        tracing::trace!(
            target: TRACING_TARGET,
            method = %request.method,
            url = %request.url,
            timeout_ms = request.timeout.as_millis(),
            "Sending request"
        );

        let result = self.dispatch(request).await;
        let elapsed = started_at.elapsed();

        match result {
            Ok(response) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    method = %request.method,
                    url = %request.url,
                    status = response.status,
                    elapsed_ms = elapsed.as_millis(),
                    "Response received"
                );
                Ok(response)
            }
            Err(error) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    method = %request.method,
                    url = %request.url,
                    error = %error,
                    elapsed_ms = elapsed.as_millis(),
                    "Request failed"
                );
                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use erlene_integration::TransportErrorKind;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::Url;

    use super::*;

    /// Serves one canned HTTP response and returns the raw request text.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (Url, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buffer = [0u8; 4096];
            loop {
                let read = socket.read(&mut buffer).await.unwrap();
                raw.extend_from_slice(&buffer[..read]);
                if read == 0 || request_complete(&raw) {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });

        let url = Url::parse(&format!("http://{address}/")).unwrap();
        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn request(method: HttpMethod, url: Url, payload: serde_json::Value) -> TransportRequest {
        TransportRequest {
            method,
            url,
            headers: HashMap::from([("Authorization".to_owned(), "APIKey abc".to_owned())]),
            payload,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_transport_creation() {
        let transport = ReqwestTransport::with_defaults().unwrap();
        assert_eq!(transport.config().http_timeout, 30);
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_method(HttpMethod::Get), Method::GET);
        assert_eq!(to_method(HttpMethod::Delete), Method::DELETE);
    }

    #[tokio::test]
    async fn test_get_sends_query_and_headers() {
        let (base, server) = serve_once("200 OK", r#"{"numero":"123"}"#).await;
        let url = base.join("processos/123").unwrap();
        let transport = ReqwestTransport::with_defaults().unwrap();

        let response = transport
            .send(&request(HttpMethod::Get, url, json!({"page": 2})))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.decode().unwrap(), json!({"numero": "123"}));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("GET /processos/123?page=2 HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("authorization: apikey abc"));
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let (base, server) = serve_once("201 Created", "{}").await;
        let transport = ReqwestTransport::with_defaults().unwrap();

        let response = transport
            .send(&request(HttpMethod::Post, base, json!({"raw": "abc"})))
            .await
            .unwrap();
        assert_eq!(response.status, 201);

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST / HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.ends_with(r#"{"raw":"abc"}"#));
    }

    #[tokio::test]
    async fn test_server_error_is_returned_not_raised() {
        let (base, server) = serve_once("500 Internal Server Error", "").await;
        let transport = ReqwestTransport::with_defaults().unwrap();

        let response = transport
            .send(&request(HttpMethod::Delete, base, serde_json::Value::Null))
            .await
            .unwrap();

        assert_eq!(response.status, 500);
        assert!(!response.is_success());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{address}/")).unwrap();
        let transport = ReqwestTransport::with_defaults().unwrap();
        let error = transport
            .send(&request(HttpMethod::Get, url, serde_json::Value::Null))
            .await
            .unwrap_err();

        assert_eq!(error.kind, TransportErrorKind::Connect);
    }
}
