//! Fixed settings of one concrete integration.

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::retry::RetryPolicy;
use crate::{Error, ErrorKind, Result};

/// Default request timeout: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Name, endpoint and call settings of an integration.
///
/// Every concrete integration owns one descriptor; the shared gateway reads
/// it on each call instead of keeping per-integration state of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationDescriptor {
    name: String,
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
    default_headers: HashMap<String, String>,
}

impl IntegrationDescriptor {
    /// Creates a descriptor with the default timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigValidation`] if the base URL is not an
    /// absolute `http`/`https` URL.
    pub fn new(name: impl Into<String>, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            Error::from_source(ErrorKind::ConfigValidation, e)
                .with_message(format!("invalid base URL '{base_url}'"))
        })?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config_validation(format!(
                "base URL must use http or https, got '{}'",
                base_url.scheme()
            )));
        }

        let mut default_headers = HashMap::new();
        default_headers.insert("Accept".to_owned(), "application/json".to_owned());

        Ok(Self {
            name: name.into(),
            base_url,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            default_headers,
        })
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry = self.retry.with_max_attempts(max_attempts);
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Adds a header sent with every call.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Integration name, the profile lookup key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL every path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Network timeout per attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry policy.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Headers sent with every call.
    pub fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Appends `path` to the base URL, keeping any base path segments.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        let joined = if path.is_empty() {
            base.to_owned()
        } else {
            format!("{base}/{path}")
        };

        Url::parse(&joined).map_err(|e| {
            Error::from_source(ErrorKind::InvalidRequest, e)
                .with_message(format!("cannot build URL from path '{path}'"))
                .with_context(self.name.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let descriptor = IntegrationDescriptor::new("cnj", "https://example.com").unwrap();
        assert_eq!(descriptor.name(), "cnj");
        assert_eq!(descriptor.timeout(), Duration::from_secs(30));
        assert_eq!(descriptor.retry().max_attempts(), 3);
        assert_eq!(
            descriptor.default_headers().get("Accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_overrides() {
        let descriptor = IntegrationDescriptor::new("gmail", "https://example.com")
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .with_max_attempts(5)
            .with_default_header("X-Client", "erlene");

        assert_eq!(descriptor.timeout(), Duration::from_secs(5));
        assert_eq!(descriptor.retry().max_attempts(), 5);
        assert_eq!(descriptor.default_headers().len(), 2);
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let error = IntegrationDescriptor::new("cnj", "not a url").unwrap_err();
        assert_eq!(error.kind, ErrorKind::ConfigValidation);

        let error = IntegrationDescriptor::new("cnj", "ftp://example.com").unwrap_err();
        assert_eq!(error.kind, ErrorKind::ConfigValidation);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let descriptor =
            IntegrationDescriptor::new("google_drive", "https://www.googleapis.com/drive/v3/")
                .unwrap();

        assert_eq!(
            descriptor.endpoint("/files").unwrap().as_str(),
            "https://www.googleapis.com/drive/v3/files"
        );
        assert_eq!(
            descriptor.endpoint("about?fields=user").unwrap().as_str(),
            "https://www.googleapis.com/drive/v3/about?fields=user"
        );
    }

    #[test]
    fn test_endpoint_empty_path() {
        let descriptor = IntegrationDescriptor::new("cnj", "https://example.com/api").unwrap();
        assert_eq!(
            descriptor.endpoint("").unwrap().as_str(),
            "https://example.com/api"
        );
    }
}
