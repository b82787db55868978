//! Profiles file loading and persistence.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use erlene_integration::{IntegrationProfile, MemoryProfileStore};

use crate::TRACING_TARGET_CONFIG;

/// JSON file holding an array of integration profiles.
#[derive(Debug, Clone)]
pub struct ProfilesFile {
    path: PathBuf,
}

impl ProfilesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file into a fresh in-memory store.
    pub fn load(&self) -> anyhow::Result<MemoryProfileStore> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read profiles from {}", self.path.display()))?;
        let profiles: Vec<IntegrationProfile> = serde_json::from_str(&text)
            .with_context(|| format!("invalid profiles file {}", self.path.display()))?;

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            path = %self.path.display(),
            count = profiles.len(),
            "profiles loaded"
        );

        Ok(MemoryProfileStore::from_profiles(profiles))
    }

    /// Writes every profile in `store` back to the file.
    ///
    /// The new content is written next to the target and renamed over it.
    pub async fn save(&self, store: &MemoryProfileStore) -> anyhow::Result<()> {
        let profiles = store.snapshot().await;
        let text = serde_json::to_string_pretty(&profiles).context("failed to encode profiles")?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, text)
            .with_context(|| format!("failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            path = %self.path.display(),
            count = profiles.len(),
            "profiles saved"
        );

        Ok(())
    }
}
