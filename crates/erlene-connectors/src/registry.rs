//! Name-keyed access to every connector sharing one gateway.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::{Args, ValueEnum};
use erlene_integration::{
    ConnectionHealth, GatewayRequest, Integration, IntegrationDescriptor, IntegrationGateway,
    Result, verify_connection,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{
    CnjIntegration, GmailIntegration, GoogleDriveIntegration, StripeIntegration, cnj, gmail,
    google_drive, stripe,
};

/// Supported integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, Display, EnumIter, EnumString)]
#[cfg_attr(feature = "config", derive(ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "config", value(rename_all = "snake_case"))]
pub enum IntegrationName {
    /// Court records (DataJud).
    Cnj,
    /// Document storage.
    GoogleDrive,
    /// Outbound email.
    Gmail,
    /// Payments.
    Stripe,
}

impl IntegrationName {
    /// Profile lookup key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cnj => cnj::INTEGRATION_NAME,
            Self::GoogleDrive => google_drive::INTEGRATION_NAME,
            Self::Gmail => gmail::INTEGRATION_NAME,
            Self::Stripe => stripe::INTEGRATION_NAME,
        }
    }
}

/// Call settings applied to every connector on top of its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ConnectorSettings {
    /// Per-request timeout in seconds for integration calls
    #[cfg_attr(
        feature = "config",
        arg(long = "integration-timeout", env = "INTEGRATION_TIMEOUT")
    )]
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Total attempts per integration call, including the first
    #[cfg_attr(
        feature = "config",
        arg(long = "integration-max-attempts", env = "INTEGRATION_MAX_ATTEMPTS")
    )]
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl ConnectorSettings {
    /// Overrides a descriptor's defaults with the configured values.
    pub fn apply(&self, mut descriptor: IntegrationDescriptor) -> IntegrationDescriptor {
        if let Some(secs) = self.timeout_secs.filter(|secs| *secs > 0) {
            descriptor = descriptor.with_timeout(Duration::from_secs(secs));
        }
        if let Some(max_attempts) = self.max_attempts {
            descriptor = descriptor.with_max_attempts(max_attempts);
        }
        descriptor
    }
}

/// Every connector, sharing one gateway.
#[derive(Debug, Clone)]
pub struct Connectors {
    gateway: IntegrationGateway,
    cnj: CnjIntegration,
    google_drive: GoogleDriveIntegration,
    gmail: GmailIntegration,
    stripe: StripeIntegration,
}

impl Connectors {
    /// Creates every connector with its default settings.
    pub fn new(gateway: IntegrationGateway) -> Result<Self> {
        Self::with_settings(gateway, &ConnectorSettings::default())
    }

    /// Creates every connector with the given overrides.
    pub fn with_settings(gateway: IntegrationGateway, settings: &ConnectorSettings) -> Result<Self> {
        Ok(Self {
            cnj: CnjIntegration::from_descriptor(
                gateway.clone(),
                settings.apply(CnjIntegration::default_descriptor()?),
            ),
            google_drive: GoogleDriveIntegration::from_descriptor(
                gateway.clone(),
                settings.apply(GoogleDriveIntegration::default_descriptor()?),
            ),
            gmail: GmailIntegration::from_descriptor(
                gateway.clone(),
                settings.apply(GmailIntegration::default_descriptor()?),
            ),
            stripe: StripeIntegration::from_descriptor(
                gateway.clone(),
                settings.apply(StripeIntegration::default_descriptor()?),
            ),
            gateway,
        })
    }

    /// Returns the shared gateway.
    pub fn gateway(&self) -> &IntegrationGateway {
        &self.gateway
    }

    pub fn cnj(&self) -> &CnjIntegration {
        &self.cnj
    }

    pub fn google_drive(&self) -> &GoogleDriveIntegration {
        &self.google_drive
    }

    pub fn gmail(&self) -> &GmailIntegration {
        &self.gmail
    }

    pub fn stripe(&self) -> &StripeIntegration {
        &self.stripe
    }

    /// Returns the descriptor of the named integration.
    pub fn descriptor(&self, name: IntegrationName) -> &IntegrationDescriptor {
        match name {
            IntegrationName::Cnj => self.cnj.descriptor(),
            IntegrationName::GoogleDrive => self.google_drive.descriptor(),
            IntegrationName::Gmail => self.gmail.descriptor(),
            IntegrationName::Stripe => self.stripe.descriptor(),
        }
    }

    /// Decodes and validates a configuration blob for the named integration.
    pub fn validate_config(&self, name: IntegrationName, blob: &serde_json::Value) -> Result<()> {
        match name {
            IntegrationName::Cnj => self.cnj.parse_config(blob).map(drop),
            IntegrationName::GoogleDrive => self.google_drive.parse_config(blob).map(drop),
            IntegrationName::Gmail => self.gmail.parse_config(blob).map(drop),
            IntegrationName::Stripe => self.stripe.parse_config(blob).map(drop),
        }
    }

    /// Validates a configuration blob and tests the connection with it.
    pub async fn verify_connection(
        &self,
        name: IntegrationName,
        blob: &serde_json::Value,
    ) -> ConnectionHealth {
        match name {
            IntegrationName::Cnj => verify_connection(&self.cnj, blob).await,
            IntegrationName::GoogleDrive => verify_connection(&self.google_drive, blob).await,
            IntegrationName::Gmail => verify_connection(&self.gmail, blob).await,
            IntegrationName::Stripe => verify_connection(&self.stripe, blob).await,
        }
    }

    /// Executes a raw call through the named integration.
    pub async fn execute(
        &self,
        name: IntegrationName,
        request: GatewayRequest,
    ) -> Result<serde_json::Value> {
        match name {
            IntegrationName::Cnj => self.gateway.execute(&self.cnj, request).await,
            IntegrationName::GoogleDrive => self.gateway.execute(&self.google_drive, request).await,
            IntegrationName::Gmail => self.gateway.execute(&self.gmail, request).await,
            IntegrationName::Stripe => self.gateway.execute(&self.stripe, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use erlene_integration::mock::{MockTransport, RecordingSleeper};
    use erlene_integration::{
        ConnectionStatus, ErrorKind, IntegrationProfile, IntegrationStatus, MemoryProfileStore,
        ProfileStore, TenantId, TransportError, TransportResponse,
    };
    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;

    fn connectors(transport: MockTransport, store: MemoryProfileStore) -> (Connectors, RecordingSleeper) {
        let sleeper = RecordingSleeper::new();
        let gateway = IntegrationGateway::new(transport, store).with_sleeper(sleeper.clone());
        (Connectors::new(gateway).unwrap(), sleeper)
    }

    #[test]
    fn test_integration_names() {
        for name in IntegrationName::iter() {
            assert_eq!(name.to_string(), name.as_str());
            assert_eq!(<IntegrationName as FromStr>::from_str(name.as_str()).unwrap(), name);
        }
        assert_eq!(
            serde_json::to_value(IntegrationName::GoogleDrive).unwrap(),
            json!("google_drive")
        );
        assert!(<IntegrationName as FromStr>::from_str("dropbox").is_err());
    }

    #[test]
    fn test_descriptors_match_names() {
        let (connectors, _) = connectors(MockTransport::new(), MemoryProfileStore::new());
        for name in IntegrationName::iter() {
            assert_eq!(connectors.descriptor(name).name(), name.as_str());
        }
    }

    #[test]
    fn test_settings_override_descriptors() {
        let gateway = IntegrationGateway::new(MockTransport::new(), MemoryProfileStore::new());
        let settings = ConnectorSettings {
            timeout_secs: Some(5),
            max_attempts: Some(1),
        };
        let connectors = Connectors::with_settings(gateway, &settings).unwrap();

        let descriptor = connectors.descriptor(IntegrationName::Stripe);
        assert_eq!(descriptor.timeout(), Duration::from_secs(5));
        assert_eq!(descriptor.retry().max_attempts(), 1);
    }

    #[test]
    fn test_validate_config_dispatches_by_name() {
        let (connectors, _) = connectors(MockTransport::new(), MemoryProfileStore::new());
        let blob = json!({"api_key": "k", "tribunal": "tjsp"});

        assert!(connectors.validate_config(IntegrationName::Cnj, &blob).is_ok());
        let error = connectors
            .validate_config(IntegrationName::Stripe, &blob)
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::ConfigValidation);
    }

    #[tokio::test]
    async fn test_verify_connection_reports_misconfiguration() {
        let transport = MockTransport::new();
        let (connectors, _) = connectors(transport.clone(), MemoryProfileStore::new());

        let health = connectors
            .verify_connection(IntegrationName::Gmail, &json!({"client_id": "id"}))
            .await;

        assert_eq!(health.status, ConnectionStatus::Misconfigured);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_execute_exhausts_and_records_failure() {
        let transport = MockTransport::new()
            .with_fallback(Err(TransportError::connect("connection refused")));
        let store = MemoryProfileStore::from_profiles([IntegrationProfile::new(
            "google_drive",
            TenantId::new(1),
            json!({"client_id": "id", "client_secret": "s", "access_token": "t"}),
        )]);
        let (connectors, sleeper) = connectors(transport.clone(), store.clone());

        let error = connectors
            .execute(
                IntegrationName::GoogleDrive,
                GatewayRequest::get("/files").with_tenant(TenantId::new(1)),
            )
            .await
            .unwrap_err();

        assert!(error.is_exhausted());
        assert_eq!(transport.call_count(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );

        let profile = store
            .find("google_drive", TenantId::new(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.total_requests, 1);
        assert_eq!(profile.failed_requests, 1);
        assert_eq!(profile.last_status, IntegrationStatus::Error);
    }

    #[tokio::test]
    async fn test_execute_without_tenant_sends_no_credentials() {
        let transport = MockTransport::always(TransportResponse::json(200, &json!({})));
        let (connectors, _) = connectors(transport.clone(), MemoryProfileStore::new());

        connectors
            .execute(IntegrationName::Cnj, GatewayRequest::get("/status"))
            .await
            .unwrap();

        let sent = &transport.requests()[0];
        assert!(!sent.headers.contains_key("Authorization"));
        assert_eq!(sent.headers["Accept"], "application/json");
    }
}
