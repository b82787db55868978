use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use erlene_connectors::IntegrationName;
use serde_json::json;

use super::{App, print_json, read_json};
use crate::TRACING_TARGET_COMMAND;

/// Arguments for `validate`.
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Integration the configuration belongs to
    #[arg(long, value_enum)]
    pub integration: IntegrationName,

    /// JSON configuration file
    #[arg(long)]
    pub config: PathBuf,
}

impl ValidateArgs {
    pub fn run(self, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
        let blob = read_json(&self.config)?;

        app.connectors()
            .validate_config(self.integration, &blob)
            .with_context(|| format!("invalid {} configuration", self.integration))?;

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            integration = %self.integration,
            "configuration is valid"
        );

        print_json(out, &json!({ "integration": self.integration, "valid": true }))
    }
}
