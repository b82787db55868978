//! Profile persistence seam.
//!
//! The gateway reads a profile once per tenant call to obtain credentials and
//! writes back exactly one [`CallOutcome`] per completed call sequence. The
//! backing store is owned by the host application; [`MemoryProfileStore`] is
//! bundled for tests and for the command-line tool.

mod memory;

pub use memory::MemoryProfileStore;

use crate::profile::{CallOutcome, IntegrationProfile, IntegrationStatus, TenantId};
use crate::Result;

/// Tracing target for profile store operations.
pub const TRACING_TARGET: &str = "erlene_integration::store";

/// Storage for per-tenant integration profiles.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Finds the profile for `(integration, tenant)`.
    async fn find(&self, integration: &str, tenant_id: TenantId)
    -> Result<Option<IntegrationProfile>>;

    /// Applies the outcome of one completed call sequence.
    ///
    /// Stores are not required to serialize concurrent updates for the same
    /// pair; counters may then be approximate.
    async fn record(
        &self,
        integration: &str,
        tenant_id: TenantId,
        outcome: &CallOutcome,
    ) -> Result<()>;

    /// Lists every profile owned by a tenant.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<IntegrationProfile>>;

    /// Returns the last known status, `unconfigured` when no profile exists.
    async fn status(&self, integration: &str, tenant_id: TenantId) -> Result<IntegrationStatus> {
        Ok(self
            .find(integration, tenant_id)
            .await?
            .map(|profile| profile.last_status)
            .unwrap_or(IntegrationStatus::Unconfigured))
    }
}
