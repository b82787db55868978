//! Per-attempt records emitted to the log sink.

use std::fmt;

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use url::Url;
use uuid::Uuid;

use crate::gateway::TRACING_TARGET;
use crate::transport::TransportError;
use crate::TenantId;

/// Longest response excerpt kept in an attempt error.
const BODY_EXCERPT_CHARS: usize = 256;

/// Outcome of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttemptOutcome {
    /// A 2xx response with a decodable body.
    Success,
    /// A failure that feeds the retry loop.
    TransientFailure,
    /// The sequence was aborted before any request was sent.
    FatalFailure,
}

/// Why a single attempt failed.
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// No response was obtained.
    Transport(TransportError),
    /// The endpoint answered outside the 2xx range.
    Status { status: u16, excerpt: String },
    /// A 2xx response whose body is not JSON.
    Decode(serde_json::Error),
}

impl AttemptError {
    pub(crate) fn status(status: u16, response: &crate::TransportResponse) -> Self {
        Self::Status {
            status,
            excerpt: response.excerpt(BODY_EXCERPT_CHARS),
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(error) => write!(f, "{error}"),
            Self::Status { status, excerpt } if excerpt.is_empty() => write!(f, "HTTP {status}"),
            Self::Status { status, excerpt } => write!(f, "HTTP {status}: {excerpt}"),
            Self::Decode(error) => write!(f, "invalid JSON response: {error}"),
        }
    }
}

/// One try within a retry sequence. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAttempt<'a> {
    /// Correlates every attempt of one call sequence.
    pub request_id: Uuid,
    /// Integration name.
    pub integration: &'a str,
    /// HTTP verb as supplied by the caller.
    pub method: &'a str,
    /// Target URL, if it could be resolved.
    pub url: Option<&'a Url>,
    /// Tenant the call is attributed to.
    pub tenant_id: Option<TenantId>,
    /// 1-based attempt number.
    pub attempt: u32,
    /// Attempt budget of the sequence.
    pub max_attempts: u32,
    /// What happened.
    pub outcome: AttemptOutcome,
    /// Failure text, if the attempt failed.
    pub error: Option<String>,
}

impl RequestAttempt<'_> {
    /// Emits this attempt as a structured log event.
    ///
    /// Absent fields (`url`, `tenant_id`, `error`) are left off the event.
    pub fn emit(&self) {
        let url = self.url.map(Url::as_str);
        let tenant_id = self.tenant_id.map(TenantId::get);
        let outcome: &'static str = self.outcome.into();
        let error = self.error.as_deref();

        match self.outcome {
            AttemptOutcome::Success => tracing::info!(
                target: TRACING_TARGET,
                request_id = %self.request_id,
                integration = self.integration,
                method = self.method,
                url,
                tenant_id,
                attempt = self.attempt,
                max_attempts = self.max_attempts,
                outcome,
                "Integration request succeeded"
            ),
            AttemptOutcome::TransientFailure => tracing::warn!(
                target: TRACING_TARGET,
                request_id = %self.request_id,
                integration = self.integration,
                method = self.method,
                url,
                tenant_id,
                attempt = self.attempt,
                max_attempts = self.max_attempts,
                outcome,
                error,
                "Integration request attempt failed"
            ),
            AttemptOutcome::FatalFailure => tracing::error!(
                target: TRACING_TARGET,
                request_id = %self.request_id,
                integration = self.integration,
                method = self.method,
                url,
                tenant_id,
                attempt = self.attempt,
                max_attempts = self.max_attempts,
                outcome,
                error,
                "Integration request aborted"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportResponse;

    #[test]
    fn test_status_error_display() {
        let error = AttemptError::status(500, &TransportResponse::new(500, ""));
        assert_eq!(error.to_string(), "HTTP 500");

        let error = AttemptError::status(404, &TransportResponse::new(404, "not found"));
        assert_eq!(error.to_string(), "HTTP 404: not found");
    }

    #[test]
    fn test_status_excerpt_is_truncated() {
        let body = "x".repeat(1000);
        let error = AttemptError::status(502, &TransportResponse::new(502, body));
        assert_eq!(error.to_string().len(), "HTTP 502: ".len() + BODY_EXCERPT_CHARS);
    }

    #[test]
    fn test_transport_error_display() {
        let error = AttemptError::Transport(TransportError::connect("connection refused"));
        assert_eq!(error.to_string(), "connect: connection refused");
    }

    #[test]
    fn test_attempt_serializes_log_fields() {
        let url = Url::parse("https://example.com/processos/123").unwrap();
        let attempt = RequestAttempt {
            request_id: Uuid::now_v7(),
            integration: "cnj",
            method: "GET",
            url: Some(&url),
            tenant_id: Some(TenantId::new(7)),
            attempt: 2,
            max_attempts: 3,
            outcome: AttemptOutcome::TransientFailure,
            error: Some("HTTP 503".into()),
        };

        let value = serde_json::to_value(&attempt).unwrap();
        assert_eq!(value["integration"], "cnj");
        assert_eq!(value["tenant_id"], 7);
        assert_eq!(value["attempt"], 2);
        assert_eq!(value["outcome"], "transient_failure");
        assert_eq!(value["error"], "HTTP 503");
        attempt.emit();
    }
}
