//! Integration profile model.

use derive_more::{Display, From, Into};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::IntegrationStatus;

/// Identifier of a tenant (an office location, or "unit").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct TenantId(u64);

impl TenantId {
    /// Creates a new tenant identifier.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Result of one completed call sequence, applied once to a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The sequence ended with a 2xx response.
    Succeeded,
    /// The sequence exhausted its attempts; carries the last failure text.
    Failed(String),
}

/// One configured third-party integration for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationProfile {
    /// Integration name (e.g. `cnj`, `google_drive`).
    pub integration: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Whether outbound calls are allowed.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Opaque configuration, decoded by the concrete integration.
    #[serde(default)]
    pub config: serde_json::Value,
    /// Completed call sequences.
    #[serde(default)]
    pub total_requests: u64,
    /// Sequences that ended in success.
    #[serde(default)]
    pub successful_requests: u64,
    /// Sequences that exhausted their attempts.
    #[serde(default)]
    pub failed_requests: u64,
    /// Status after the most recent sequence.
    #[serde(default)]
    pub last_status: IntegrationStatus,
    /// Failure text of the most recent failed sequence, cleared on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// When the most recent sequence completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request_at: Option<Timestamp>,
}

fn default_active() -> bool {
    true
}

impl IntegrationProfile {
    /// Creates an active profile with zeroed counters.
    pub fn new(
        integration: impl Into<String>,
        tenant_id: TenantId,
        config: serde_json::Value,
    ) -> Self {
        Self {
            integration: integration.into(),
            tenant_id,
            is_active: true,
            config,
            total_requests: 0,
            successful_requests: 0,
            failed_requests: 0,
            last_status: IntegrationStatus::Unconfigured,
            last_error: None,
            last_request_at: None,
        }
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Applies the outcome of one completed call sequence.
    pub fn apply(&mut self, outcome: &CallOutcome) {
        self.total_requests += 1;
        self.last_request_at = Some(Timestamp::now());

        match outcome {
            CallOutcome::Succeeded => {
                self.successful_requests += 1;
                self.last_status = IntegrationStatus::Working;
                self.last_error = None;
            }
            CallOutcome::Failed(message) => {
                self.failed_requests += 1;
                self.last_status = IntegrationStatus::Error;
                self.last_error = Some(message.clone());
            }
        }
    }

    /// Share of completed sequences that succeeded, if any completed.
    pub fn success_rate(&self) -> Option<f64> {
        (self.total_requests > 0)
            .then(|| self.successful_requests as f64 / self.total_requests as f64)
    }

    /// Returns whether the integration is active and its last call succeeded.
    pub fn is_operational(&self) -> bool {
        self.is_active && self.last_status.is_operational()
    }

    /// Returns whether the integration needs attention (has errors or is disabled).
    pub fn needs_attention(&self) -> bool {
        self.last_status.has_failed() || !self.is_active
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn profile() -> IntegrationProfile {
        IntegrationProfile::new("cnj", TenantId::new(7), json!({"api_key": "k"}))
    }

    #[test]
    fn test_new_profile_defaults() {
        let profile = profile();
        assert!(profile.is_active);
        assert_eq!(profile.total_requests, 0);
        assert_eq!(profile.last_status, IntegrationStatus::Unconfigured);
        assert!(profile.success_rate().is_none());
    }

    #[test]
    fn test_apply_success_clears_error() {
        let mut profile = profile();
        profile.apply(&CallOutcome::Failed("HTTP 500".into()));
        profile.apply(&CallOutcome::Succeeded);

        assert_eq!(profile.total_requests, 2);
        assert_eq!(profile.successful_requests, 1);
        assert_eq!(profile.failed_requests, 1);
        assert_eq!(profile.last_status, IntegrationStatus::Working);
        assert!(profile.last_error.is_none());
        assert!(profile.last_request_at.is_some());
    }

    #[test]
    fn test_apply_failure_sets_error() {
        let mut profile = profile();
        profile.apply(&CallOutcome::Succeeded);
        profile.apply(&CallOutcome::Failed("timed out".into()));

        assert_eq!(profile.last_status, IntegrationStatus::Error);
        assert_eq!(profile.last_error.as_deref(), Some("timed out"));
        assert!(profile.needs_attention());
        assert!(!profile.is_operational());
    }

    #[test]
    fn test_counters_never_exceed_total() {
        let mut profile = profile();
        for i in 0..10 {
            if i % 3 == 0 {
                profile.apply(&CallOutcome::Failed("x".into()));
            } else {
                profile.apply(&CallOutcome::Succeeded);
            }
            assert_eq!(
                profile.successful_requests + profile.failed_requests,
                profile.total_requests
            );
        }
        assert_eq!(profile.success_rate(), Some(0.6));
    }

    #[test]
    fn test_deserialize_minimal_row() {
        let profile: IntegrationProfile = serde_json::from_value(json!({
            "integration": "gmail",
            "tenant_id": 3,
        }))
        .unwrap();

        assert_eq!(profile.tenant_id, TenantId::new(3));
        assert!(profile.is_active);
        assert!(profile.config.is_null());
        assert_eq!(profile.last_status, IntegrationStatus::Unconfigured);
    }
}
