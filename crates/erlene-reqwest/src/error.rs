//! Error types for erlene-reqwest.

use erlene_integration::{TransportError, TransportErrorKind};
use thiserror::Error;

/// Result type alias for erlene-reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for erlene-reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client construction or request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<Error> for TransportError {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                if e.is_timeout() {
                    TransportError::timeout(e.to_string())
                } else if e.is_connect() {
                    TransportError::connect(format!("Connection failed: {e}"))
                } else if e.is_builder() {
                    TransportError::new(TransportErrorKind::Request, e.to_string())
                } else {
                    TransportError::new(TransportErrorKind::Other, e.to_string())
                }
            }
        }
    }
}
