//! Court records lookup through the CNJ public DataJud API.

use std::collections::HashMap;

use erlene_integration::{
    ConnectionHealth, Error, ErrorKind, GatewayRequest, Integration, IntegrationDescriptor,
    IntegrationGateway, Result, TenantId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::{Validate, ValidationError};

/// Integration name used for profile lookups.
pub const INTEGRATION_NAME: &str = "cnj";

/// DataJud public API endpoint.
pub const BASE_URL: &str = "https://api-publica.datajud.cnj.jus.br";

/// Tracing target for court lookup operations.
pub const TRACING_TARGET: &str = "erlene_connectors::cnj";

/// Digits in a unified CNJ process number (NNNNNNN-DD.AAAA.J.TR.OOOO).
const PROCESS_NUMBER_DIGITS: usize = 20;

/// Credentials for the DataJud API.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CnjConfig {
    /// Public API key issued by CNJ.
    #[validate(length(min = 1))]
    pub api_key: String,
    /// Court alias used in search endpoints (e.g. `tjsp`, `trf1`).
    #[validate(custom(function = "validate_tribunal"))]
    pub tribunal: String,
}

fn validate_tribunal(tribunal: &str) -> Result<(), ValidationError> {
    let valid = !tribunal.is_empty()
        && tribunal
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("tribunal_alias"))
    }
}

/// Normalizes a process number to its 20 digits.
pub fn normalize_process_number(number: &str) -> Result<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    let separators_only = number
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '));

    if digits.len() != PROCESS_NUMBER_DIGITS || !separators_only {
        return Err(Error::new(ErrorKind::InvalidRequest)
            .with_message(format!("'{number}' is not a CNJ process number")));
    }

    Ok(digits)
}

/// Court records lookup.
#[derive(Debug, Clone)]
pub struct CnjIntegration {
    descriptor: IntegrationDescriptor,
    gateway: IntegrationGateway,
}

impl CnjIntegration {
    /// Creates the integration with its default descriptor.
    pub fn new(gateway: IntegrationGateway) -> Result<Self> {
        Ok(Self::from_descriptor(gateway, Self::default_descriptor()?))
    }

    /// Creates the integration with a custom descriptor.
    pub fn from_descriptor(gateway: IntegrationGateway, descriptor: IntegrationDescriptor) -> Self {
        Self {
            descriptor,
            gateway,
        }
    }

    /// Default name, endpoint and call settings.
    pub fn default_descriptor() -> Result<IntegrationDescriptor> {
        IntegrationDescriptor::new(INTEGRATION_NAME, BASE_URL)
    }

    /// Fetches one process by number.
    pub async fn consult_process(&self, tenant_id: TenantId, number: &str) -> Result<serde_json::Value> {
        let number = normalize_process_number(number)?;

        tracing::debug!(
            target: TRACING_TARGET,
            tenant_id = %tenant_id,
            number = %number,
            "Consulting process"
        );

        let request = GatewayRequest::get(format!("/processos/{number}")).with_tenant(tenant_id);
        self.gateway.execute(self, request).await
    }

    /// Searches a court's index for a process number.
    pub async fn search_processes(
        &self,
        tenant_id: TenantId,
        tribunal: &str,
        number: &str,
    ) -> Result<serde_json::Value> {
        let number = normalize_process_number(number)?;
        validate_tribunal(tribunal).map_err(|_| {
            Error::new(ErrorKind::InvalidRequest)
                .with_message(format!("'{tribunal}' is not a court alias"))
        })?;

        let request = GatewayRequest::post(search_path(tribunal))
            .with_payload(json!({
                "query": { "match": { "numeroProcesso": number } }
            }))
            .with_tenant(tenant_id);
        self.gateway.execute(self, request).await
    }
}

fn search_path(tribunal: &str) -> String {
    format!("/api_publica_{tribunal}/_search")
}

#[async_trait::async_trait]
impl Integration for CnjIntegration {
    type Config = CnjConfig;

    fn descriptor(&self) -> &IntegrationDescriptor {
        &self.descriptor
    }

    fn credential_headers(&self, config: &CnjConfig) -> HashMap<String, String> {
        HashMap::from([(
            "Authorization".to_owned(),
            format!("APIKey {}", config.api_key),
        )])
    }

    async fn test_connection(&self, config: &CnjConfig) -> Result<ConnectionHealth> {
        let request = GatewayRequest::post(search_path(&config.tribunal)).with_payload(json!({
            "size": 0,
            "query": { "match_all": {} }
        }));
        let body = self.gateway.probe(self, config, request).await?;

        let mut health = ConnectionHealth::healthy()
            .with_metric("tribunal", config.tribunal.clone().into());
        if let Some(total) = body.pointer("/hits/total/value") {
            health = health.with_metric("indexed_processes", total.clone());
        }
        Ok(health)
    }
}
