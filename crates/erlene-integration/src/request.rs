//! Gateway call request.

use std::collections::HashMap;
use std::time::Duration;

use crate::TenantId;

/// A call issued through the gateway.
///
/// The method is kept as the caller supplied it and validated when the call
/// is executed, so unsupported verbs surface as a typed error.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    /// HTTP verb as supplied by the caller.
    pub method: String,
    /// Path appended to the integration's base URL.
    pub path: String,
    /// Query parameters (GET) or JSON body (other verbs).
    pub payload: serde_json::Value,
    /// Extra headers; they override default and credential headers.
    pub headers: HashMap<String, String>,
    /// Tenant used for the profile lookup and statistics.
    pub tenant_id: Option<TenantId>,
    /// Optional timeout override (uses the descriptor's if not set).
    pub timeout: Option<Duration>,
}

impl GatewayRequest {
    /// Creates a new request with an empty payload.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            payload: serde_json::Value::Null,
            headers: HashMap::new(),
            tenant_id: None,
            timeout: None,
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    /// Creates a PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new("PUT", path)
    }

    /// Creates a DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attributes the call to a tenant.
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Adds a custom header to the request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple custom headers.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_creation() {
        let request = GatewayRequest::get("/processos/123").with_tenant(TenantId::new(7));

        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/processos/123");
        assert!(request.payload.is_null());
        assert_eq!(request.tenant_id, Some(TenantId::new(7)));
        assert!(request.timeout.is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = GatewayRequest::post("/messages/send")
            .with_payload(json!({"raw": "abc"}))
            .with_header("X-Trace", "1")
            .with_headers(HashMap::from([("X-Other".to_owned(), "2".to_owned())]))
            .with_timeout(Duration::from_secs(10));

        assert_eq!(request.method, "POST");
        assert_eq!(request.payload["raw"], "abc");
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.timeout, Some(Duration::from_secs(10)));
    }
}
