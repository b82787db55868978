//! In-memory profile store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{ProfileStore, TRACING_TARGET};
use crate::Result;
use crate::profile::{CallOutcome, IntegrationProfile, TenantId};

type ProfileKey = (String, TenantId);

/// Profile store backed by a map behind an async lock.
///
/// Each [`record`](ProfileStore::record) runs under one write lock, so
/// counters stay exact under concurrent calls. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    inner: Arc<RwLock<HashMap<ProfileKey, IntegrationProfile>>>,
}

impl MemoryProfileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the given profiles.
    pub fn from_profiles(profiles: impl IntoIterator<Item = IntegrationProfile>) -> Self {
        let map = profiles
            .into_iter()
            .map(|profile| ((profile.integration.clone(), profile.tenant_id), profile))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Inserts or replaces a profile.
    pub async fn upsert(&self, profile: IntegrationProfile) {
        let key = (profile.integration.clone(), profile.tenant_id);
        self.inner.write().await.insert(key, profile);
    }

    /// Removes a profile, returning it if present.
    pub async fn remove(&self, integration: &str, tenant_id: TenantId) -> Option<IntegrationProfile> {
        self.inner
            .write()
            .await
            .remove(&(integration.to_owned(), tenant_id))
    }

    /// Returns every stored profile ordered by tenant and integration name.
    pub async fn snapshot(&self) -> Vec<IntegrationProfile> {
        let mut profiles: Vec<_> = self.inner.read().await.values().cloned().collect();
        profiles.sort_by(|a, b| {
            (a.tenant_id, &a.integration).cmp(&(b.tenant_id, &b.integration))
        });
        profiles
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn find(
        &self,
        integration: &str,
        tenant_id: TenantId,
    ) -> Result<Option<IntegrationProfile>> {
        Ok(self
            .inner
            .read()
            .await
            .get(&(integration.to_owned(), tenant_id))
            .cloned())
    }

    async fn record(
        &self,
        integration: &str,
        tenant_id: TenantId,
        outcome: &CallOutcome,
    ) -> Result<()> {
        let mut profiles = self.inner.write().await;

        match profiles.get_mut(&(integration.to_owned(), tenant_id)) {
            Some(profile) => {
                profile.apply(outcome);
                tracing::trace!(
                    target: TRACING_TARGET,
                    integration,
                    tenant_id = %tenant_id,
                    total = profile.total_requests,
                    status = %profile.last_status,
                    "Profile counters updated"
                );
            }
            None => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    integration,
                    tenant_id = %tenant_id,
                    "Profile removed before outcome was recorded"
                );
            }
        }

        Ok(())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<IntegrationProfile>> {
        let mut profiles: Vec<_> = self
            .inner
            .read()
            .await
            .values()
            .filter(|profile| profile.tenant_id == tenant_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.integration.cmp(&b.integration));
        Ok(profiles)
    }
}
