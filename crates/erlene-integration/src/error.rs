//! Structured error handling for gateway operations.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::TenantId;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that cross the gateway boundary.
///
/// Individual attempt failures are absorbed by the retry loop and never
/// surface as a kind of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No active profile exists for the integration and tenant.
    NotConfigured,
    /// The caller asked for an HTTP verb the gateway does not issue.
    InvalidMethod,
    /// The target URL could not be built.
    InvalidRequest,
    /// Every allowed attempt failed.
    RequestExhausted,
    /// A required configuration field is missing or malformed.
    ConfigValidation,
    /// The profile store failed.
    Storage,
    /// An inbound webhook signature was rejected.
    InvalidSignature,
}

impl ErrorKind {
    /// Check if a later call with the same input may succeed.
    ///
    /// Attempt-level retries already ran inside the gateway; this only
    /// tells callers whether scheduling the whole call again makes sense.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RequestExhausted | Self::Storage)
    }
}

/// Structured error type with classification and context tracking.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Primary error message.
    pub message: Option<String>,
    /// Underlying source error, if any.
    #[source]
    pub source: Option<BoxedError>,
    /// Additional context information.
    pub context: Option<String>,
    /// Number of attempts consumed before the error, for exhausted sequences.
    pub attempts: Option<u32>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
            context: None,
            attempts: None,
        }
    }

    /// Creates a new error from a source error.
    pub fn from_source(kind: ErrorKind, source: impl Into<BoxedError>) -> Self {
        Self::new(kind).with_source(source)
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds context to the error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// No active profile for `(integration, tenant)`.
    pub fn not_configured(integration: &str, tenant_id: TenantId) -> Self {
        Self::new(ErrorKind::NotConfigured)
            .with_message(format!(
                "integration '{integration}' is not configured for tenant {tenant_id}"
            ))
            .with_context(integration.to_owned())
    }

    /// Unsupported HTTP verb.
    pub fn invalid_method(method: &str) -> Self {
        Self::new(ErrorKind::InvalidMethod)
            .with_message(format!("unsupported HTTP method '{method}'"))
    }

    /// All attempts consumed; carries the last attempt's failure text.
    pub fn request_exhausted(attempts: u32, last_error: impl Into<String>) -> Self {
        let mut error = Self::new(ErrorKind::RequestExhausted).with_message(last_error);
        error.attempts = Some(attempts);
        error
    }

    /// Missing or malformed configuration.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigValidation).with_message(message)
    }

    /// Profile store failure.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage).with_message(message)
    }

    /// Rejected webhook signature.
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSignature).with_message(message)
    }

    /// Returns true if the integration is not configured for the tenant.
    #[must_use]
    pub const fn is_not_configured(&self) -> bool {
        matches!(self.kind, ErrorKind::NotConfigured)
    }

    /// Returns true if the call ran out of attempts.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::RequestExhausted)
    }

    /// Returns true if the error describes bad configuration.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::NotConfigured | ErrorKind::ConfigValidation
        )
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<String> = field_errors.keys().map(ToString::to_string).collect();
        fields.sort_unstable();
        drop(field_errors);

        Self::config_validation(format!("invalid configuration fields: {}", fields.join(", ")))
            .with_source(errors)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::config_validation(error.to_string()).with_source(error)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use validator::Validate;

    use super::*;

    #[test]
    fn test_error_builder_pattern() {
        let error = Error::new(ErrorKind::Storage)
            .with_message("connection reset")
            .with_context("profiles");

        assert_eq!(error.kind, ErrorKind::Storage);
        assert_eq!(error.message.as_deref(), Some("connection reset"));
        assert_eq!(error.context.as_deref(), Some("profiles"));
        assert!(error.attempts.is_none());
    }

    #[test]
    fn test_error_display() {
        let error = Error::not_configured("gmail", TenantId::new(3));
        let display_str = error.to_string();

        assert!(display_str.contains("not_configured"));
        assert!(display_str.contains("gmail"));
        assert!(display_str.contains("tenant 3"));
    }

    #[test]
    fn test_request_exhausted_carries_attempts() {
        let error = Error::request_exhausted(3, "HTTP 500");

        assert!(error.is_exhausted());
        assert_eq!(error.attempts, Some(3));
        assert_eq!(error.message.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::request_exhausted(1, "boom").is_retryable());
        assert!(Error::storage("down").is_retryable());

        assert!(!Error::invalid_method("PATCH").is_retryable());
        assert!(!Error::not_configured("cnj", TenantId::new(1)).is_retryable());
        assert!(!Error::config_validation("missing api_key").is_retryable());
        assert!(!Error::new(ErrorKind::InvalidRequest).is_retryable());
        assert!(!Error::new(ErrorKind::InvalidSignature).is_retryable());
    }

    #[test]
    fn test_config_error_predicate() {
        assert!(Error::config_validation("missing api_key").is_config_error());
        assert!(Error::not_configured("cnj", TenantId::new(1)).is_config_error());
        assert!(!Error::storage("down").is_config_error());
    }

    #[test]
    fn test_from_validation_errors_names_fields() {
        #[derive(Validate)]
        struct Credentials {
            #[validate(length(min = 1))]
            api_key: String,
            #[validate(length(min = 1))]
            tribunal: String,
        }

        let credentials = Credentials {
            api_key: String::new(),
            tribunal: String::new(),
        };
        let error = Error::from(credentials.validate().unwrap_err());

        assert_eq!(error.kind, ErrorKind::ConfigValidation);
        let message = error.message.unwrap();
        assert!(message.contains("api_key"));
        assert!(message.contains("tribunal"));
    }

    #[test]
    fn test_from_str() {
        assert_eq!(
            ErrorKind::from_str("not_configured").unwrap(),
            ErrorKind::NotConfigured
        );
        assert_eq!(
            ErrorKind::from_str("request_exhausted").unwrap(),
            ErrorKind::RequestExhausted
        );
        assert!(ErrorKind::from_str("transient_failure").is_err());
    }
}
