use std::io::Write;

use clap::Args;
use erlene_connectors::IntegrationName;
use erlene_integration::{IntegrationProfile, IntegrationStatus, ProfileStore, TenantId};
use jiff::Timestamp;
use serde::Serialize;
use strum::IntoEnumIterator;

use super::{App, print_json};

/// Arguments for `status`.
#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    /// Tenant to report on
    #[arg(long)]
    pub tenant: u64,
}

/// Health of one integration for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct StatusRow {
    integration: IntegrationName,
    configured: bool,
    active: bool,
    status: IntegrationStatus,
    description: &'static str,
    total_requests: u64,
    successful_requests: u64,
    failed_requests: u64,
    success_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_request_at: Option<Timestamp>,
}

impl StatusRow {
    fn new(integration: IntegrationName, profile: Option<&IntegrationProfile>) -> Self {
        let Some(profile) = profile else {
            let status = IntegrationStatus::Unconfigured;
            return Self {
                integration,
                configured: false,
                active: false,
                status,
                description: status.description(),
                total_requests: 0,
                successful_requests: 0,
                failed_requests: 0,
                success_rate: None,
                last_error: None,
                last_request_at: None,
            };
        };

        Self {
            integration,
            configured: true,
            active: profile.is_active,
            status: profile.last_status,
            description: profile.last_status.description(),
            total_requests: profile.total_requests,
            successful_requests: profile.successful_requests,
            failed_requests: profile.failed_requests,
            success_rate: profile.success_rate(),
            last_error: profile.last_error.clone(),
            last_request_at: profile.last_request_at,
        }
    }
}

impl StatusArgs {
    pub async fn run(self, app: &App, out: &mut impl Write) -> anyhow::Result<()> {
        let profiles = app.store().list_by_tenant(TenantId::new(self.tenant)).await?;

        let rows: Vec<StatusRow> = IntegrationName::iter()
            .map(|name| {
                let profile = profiles
                    .iter()
                    .find(|profile| profile.integration == name.as_str());
                StatusRow::new(name, profile)
            })
            .collect();

        print_json(out, &rows)
    }
}

#[cfg(test)]
mod tests {
    use erlene_integration::CallOutcome;
    use erlene_integration::mock::MockTransport;
    use serde_json::json;

    use super::*;
    use crate::command::testing::{app, output};

    #[tokio::test]
    async fn test_status_lists_every_integration() {
        let mut cnj = IntegrationProfile::new("cnj", TenantId::new(7), json!({}));
        cnj.apply(&CallOutcome::Succeeded);
        cnj.apply(&CallOutcome::Failed("HTTP 503".to_owned()));
        let gmail = IntegrationProfile::new("gmail", TenantId::new(7), json!({})).with_active(false);
        let other_tenant = IntegrationProfile::new("stripe", TenantId::new(8), json!({}));

        let app = app(MockTransport::new(), vec![cnj, gmail, other_tenant], None);

        let mut buffer = Vec::new();
        StatusArgs { tenant: 7 }.run(&app, &mut buffer).await.unwrap();
        let rows = output(buffer);

        assert_eq!(rows.as_array().unwrap().len(), 4);

        assert_eq!(rows[0]["integration"], "cnj");
        assert_eq!(rows[0]["status"], "error");
        assert_eq!(rows[0]["total_requests"], 2);
        assert_eq!(rows[0]["success_rate"], 0.5);
        assert_eq!(rows[0]["last_error"], "HTTP 503");

        assert_eq!(rows[1]["integration"], "google_drive");
        assert_eq!(rows[1]["configured"], false);
        assert_eq!(rows[1]["status"], "unconfigured");

        assert_eq!(rows[2]["integration"], "gmail");
        assert_eq!(rows[2]["active"], false);
        assert_eq!(rows[2]["status"], "unconfigured");

        assert_eq!(rows[3]["integration"], "stripe");
        assert_eq!(rows[3]["configured"], false);
    }
}
