use std::io::Write;

use anyhow::Context;
use clap::Args;
use erlene_connectors::IntegrationName;
use erlene_integration::{GatewayRequest, TenantId};

use super::{App, print_json};
use crate::TRACING_TARGET_COMMAND;

/// Arguments for `execute`.
#[derive(Debug, Clone, Args)]
pub struct ExecuteArgs {
    /// Integration to call
    #[arg(long, value_enum)]
    pub integration: IntegrationName,

    /// Tenant whose credentials and counters are used
    #[arg(long)]
    pub tenant: u64,

    /// HTTP method (GET, POST, PUT or DELETE)
    #[arg(long, default_value = "GET")]
    pub method: String,

    /// Path appended to the integration's base URL
    #[arg(long)]
    pub path: String,

    /// JSON payload: query parameters for GET, request body otherwise
    #[arg(long)]
    pub payload: Option<String>,

    /// Write the updated counters back to the profiles file
    #[arg(long)]
    pub persist: bool,
}

impl ExecuteArgs {
    pub async fn run(self, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
        let profiles = match (self.persist, app.profiles()) {
            (true, None) => anyhow::bail!("--persist requires a profiles file (--profiles)"),
            (true, Some(file)) => Some(file),
            (false, _) => None,
        };

        let payload = match &self.payload {
            Some(text) => serde_json::from_str(text).context("--payload is not valid JSON")?,
            None => serde_json::Value::Null,
        };

        let tenant_id = TenantId::new(self.tenant);
        let request = GatewayRequest::new(&self.method, &self.path)
            .with_payload(payload)
            .with_tenant(tenant_id);

        tracing::debug!(
            target: TRACING_TARGET_COMMAND,
            integration = %self.integration,
            tenant_id = %tenant_id,
            method = %self.method,
            path = %self.path,
            "executing request"
        );

        let result = app.connectors().execute(self.integration, request).await;

        // Counters change on failure too, so they are saved before the
        // outcome is inspected.
        if let Some(file) = profiles {
            file.save(app.store()).await?;
        }

        let body = result.with_context(|| format!("{} request failed", self.integration))?;
        print_json(out, &body)
    }
}
