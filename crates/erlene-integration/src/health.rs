//! Connection health reports produced by integration checks.

use std::collections::HashMap;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of a connection check.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Credentials were accepted and the service answered.
    #[default]
    Healthy,
    /// The configuration is invalid; no request was sent.
    Misconfigured,
    /// The service could not be reached or rejected the request.
    Unreachable,
}

/// Health information for one integration configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConnectionHealth {
    /// Current status.
    pub status: ConnectionStatus,
    /// Time taken by the check.
    pub response: Option<Duration>,
    /// Optional message describing the current state.
    pub message: Option<String>,
    /// Timestamp when the check was performed.
    pub checked_at: Timestamp,
    /// Additional details returned by the service.
    pub metrics: HashMap<String, Value>,
}

impl ConnectionHealth {
    /// Creates a healthy report.
    pub fn healthy() -> Self {
        Self {
            status: ConnectionStatus::Healthy,
            checked_at: Timestamp::now(),
            ..Default::default()
        }
    }

    /// Creates a report for a configuration that failed validation.
    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Misconfigured,
            message: Some(message.into()),
            checked_at: Timestamp::now(),
            ..Default::default()
        }
    }

    /// Creates a report for a service that could not be reached.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Unreachable,
            message: Some(message.into()),
            checked_at: Timestamp::now(),
            ..Default::default()
        }
    }

    /// Sets the response time for this check.
    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response = Some(response_time);
        self
    }

    /// Adds a metric to the report.
    pub fn with_metric(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }

    /// Returns whether the check passed.
    pub fn is_healthy(&self) -> bool {
        self.status == ConnectionStatus::Healthy
    }
}
