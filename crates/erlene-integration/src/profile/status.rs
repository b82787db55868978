//! Integration status enumeration for health bookkeeping.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Last known operational status of an integration for one tenant.
///
/// The status reflects only the most recently completed call sequence;
/// earlier outcomes are visible through the profile counters.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IntegrationStatus {
    /// The last call sequence ended in success.
    Working,

    /// The last call sequence exhausted its attempts.
    Error,

    /// No profile exists, or no call sequence has completed yet.
    #[default]
    Unconfigured,
}

impl IntegrationStatus {
    /// Returns whether the integration is operational.
    #[inline]
    pub fn is_operational(self) -> bool {
        matches!(self, IntegrationStatus::Working)
    }

    /// Returns whether the integration has failed.
    #[inline]
    pub fn has_failed(self) -> bool {
        matches!(self, IntegrationStatus::Error)
    }

    /// Returns a description of what the integration status means.
    #[inline]
    pub fn description(self) -> &'static str {
        match self {
            IntegrationStatus::Working => "Integration answered its most recent request",
            IntegrationStatus::Error => {
                "Integration failed its most recent request and requires attention"
            }
            IntegrationStatus::Unconfigured => "Integration has not been configured or used yet",
        }
    }
}
