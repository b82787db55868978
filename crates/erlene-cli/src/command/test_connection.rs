use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use erlene_connectors::IntegrationName;

use super::{App, print_json, read_json};
use crate::TRACING_TARGET_COMMAND;

/// Arguments for `test-connection`.
#[derive(Debug, Clone, Args)]
pub struct TestConnectionArgs {
    /// Integration the configuration belongs to
    #[arg(long, value_enum)]
    pub integration: IntegrationName,

    /// JSON configuration file
    #[arg(long)]
    pub config: PathBuf,
}

impl TestConnectionArgs {
    /// Prints the health report; fails when the connection is not healthy.
    pub async fn run(self, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
        let blob = read_json(&self.config)?;
        let health = app
            .connectors()
            .verify_connection(self.integration, &blob)
            .await;

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            integration = %self.integration,
            status = ?health.status,
            "connection checked"
        );

        print_json(out, &health)?;

        if !health.is_healthy() {
            anyhow::bail!(
                "{} connection check failed: {}",
                self.integration,
                health.message.as_deref().unwrap_or("no details")
            );
        }

        Ok(())
    }
}
