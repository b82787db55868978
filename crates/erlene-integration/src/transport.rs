//! HTTP transport seam used by the gateway.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use url::Url;

use crate::HttpMethod;

/// One fully resolved HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: Url,
    /// Merged default, credential and custom headers.
    pub headers: HashMap<String, String>,
    /// Query parameters (GET) or JSON body (other verbs).
    pub payload: serde_json::Value,
    /// Network timeout for this request.
    pub timeout: Duration,
}

impl TransportRequest {
    /// Returns the payload as query parameters for GET requests.
    pub fn query(&self) -> Option<&serde_json::Value> {
        (self.method.sends_query() && !is_empty_payload(&self.payload)).then_some(&self.payload)
    }

    /// Returns the payload as a JSON body for non-GET requests.
    pub fn body(&self) -> Option<&serde_json::Value> {
        (!self.method.sends_query() && !self.payload.is_null()).then_some(&self.payload)
    }
}

fn is_empty_payload(payload: &serde_json::Value) -> bool {
    match payload {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Raw HTTP response returned by a transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Creates a new response.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a response with a JSON body.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Returns whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON; an empty body decodes to `null`.
    pub fn decode(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.body)
    }

    /// Returns a short, lossy excerpt of the body for diagnostics.
    pub fn excerpt(&self, max_chars: usize) -> String {
        String::from_utf8_lossy(&self.body)
            .chars()
            .take(max_chars)
            .collect()
    }
}

/// Classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum TransportErrorKind {
    /// The request did not complete within its timeout.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// The request could not be built.
    Request,
    /// Any other I/O or protocol failure.
    Other,
}

/// Failure to obtain any response from the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Failure classification.
    pub kind: TransportErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl TransportError {
    /// Creates a new transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    /// Creates a connection error.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for TransportError {}

/// Generic HTTP client used for every outbound integration call.
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request and returns whatever response arrived.
    ///
    /// Non-2xx responses are returned as `Ok`; only failures to obtain a
    /// response are errors.
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(method: HttpMethod, payload: serde_json::Value) -> TransportRequest {
        TransportRequest {
            method,
            url: Url::parse("https://example.com/a").unwrap(),
            headers: HashMap::new(),
            payload,
            timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_get_payload_is_query() {
        let request = request(HttpMethod::Get, json!({"page": 2}));
        assert_eq!(request.query(), Some(&json!({"page": 2})));
        assert!(request.body().is_none());
    }

    #[test]
    fn test_empty_get_payload_has_no_query() {
        assert!(request(HttpMethod::Get, json!({})).query().is_none());
        assert!(request(HttpMethod::Get, serde_json::Value::Null).query().is_none());
    }

    #[test]
    fn test_post_payload_is_body() {
        let request = request(HttpMethod::Post, json!({"to": "x"}));
        assert!(request.query().is_none());
        assert_eq!(request.body(), Some(&json!({"to": "x"})));
    }

    #[test]
    fn test_response_success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(!TransportResponse::new(500, "").is_success());
    }

    #[test]
    fn test_decode() {
        let response = TransportResponse::json(200, &json!({"numero": "123"}));
        assert_eq!(response.decode().unwrap(), json!({"numero": "123"}));

        assert!(TransportResponse::new(204, "").decode().unwrap().is_null());
        assert!(TransportResponse::new(200, "<html>").decode().is_err());
    }

    #[test]
    fn test_transport_error_display() {
        let error = TransportError::timeout("after 30s");
        assert_eq!(error.to_string(), "timeout: after 30s");
    }
}
