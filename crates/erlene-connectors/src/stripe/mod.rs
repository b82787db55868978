//! Payments through the Stripe API.
//!
//! Outbound calls go through the gateway like every other integration.
//! Inbound webhook events are checked against the tenant's signing secret
//! with [`StripeIntegration::verify_webhook`].

mod signature;

use std::collections::HashMap;

use erlene_integration::{
    ConnectionHealth, Error, ErrorKind, GatewayRequest, Integration, IntegrationDescriptor,
    IntegrationGateway, ProfileStore, Result, TenantId,
};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

pub use self::signature::{SIGNATURE_TOLERANCE_SECS, sign_payload, verify_signature};

/// Integration name used for profile lookups.
pub const INTEGRATION_NAME: &str = "stripe";

/// Stripe v1 API endpoint.
pub const BASE_URL: &str = "https://api.stripe.com/v1";

/// Tracing target for payment operations.
pub const TRACING_TARGET: &str = "erlene_connectors::stripe";

/// API credentials for a Stripe account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StripeConfig {
    /// Secret API key (`sk_live_...` or `sk_test_...`).
    #[validate(custom(function = "validate_secret_key"))]
    pub secret_key: String,
    /// Endpoint signing secret (`whsec_...`) used to verify webhooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

fn validate_secret_key(key: &str) -> Result<(), ValidationError> {
    if key.starts_with("sk_") && key.len() > 3 {
        Ok(())
    } else {
        Err(ValidationError::new("secret_key_prefix"))
    }
}

impl StripeConfig {
    /// Returns `true` for test-mode keys.
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }
}

/// A verified webhook event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Payments.
#[derive(Debug, Clone)]
pub struct StripeIntegration {
    descriptor: IntegrationDescriptor,
    gateway: IntegrationGateway,
}

impl StripeIntegration {
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

    /// Fetches a payment intent by id.
    pub async fn retrieve_payment_intent(
        &self,
        tenant_id: TenantId,
        intent_id: &str,
    ) -> Result<serde_json::Value> {
        if !intent_id.starts_with("pi_") || intent_id.contains('/') {
            return Err(Error::new(ErrorKind::InvalidRequest)
                .with_message(format!("'{intent_id}' is not a payment intent id")));
        }

        let request = GatewayRequest::get(format!("/payment_intents/{intent_id}")).with_tenant(tenant_id);
        self.gateway.execute(self, request).await
    }

    /// Verifies an inbound webhook with the tenant's signing secret and
    /// decodes the event.
    pub async fn verify_webhook(
        &self,
        tenant_id: TenantId,
        signature_header: &str,
        payload: &[u8],
        now: Timestamp,
    ) -> Result<StripeEvent> {
        let profile = self
            .gateway
            .profiles()
            .find(INTEGRATION_NAME, tenant_id)
            .await?
            .filter(|profile| profile.is_active)
            .ok_or_else(|| Error::not_configured(INTEGRATION_NAME, tenant_id))?;

        let config = self.parse_config(&profile.config)?;
        let secret = config
            .webhook_secret
            .as_deref()
            .ok_or_else(|| Error::config_validation("webhook_secret is required to verify events"))?;

        if let Err(error) = verify_signature(secret, signature_header, payload, now) {
            tracing::warn!(
                target: TRACING_TARGET,
                tenant_id = %tenant_id,
                error = %error,
                "Rejected webhook"
            );
            return Err(error);
        }

        let event: StripeEvent = serde_json::from_slice(payload).map_err(|e| {
            Error::from_source(ErrorKind::InvalidRequest, e).with_message("webhook payload is not an event")
        })?;

        tracing::info!(
            target: TRACING_TARGET,
            tenant_id = %tenant_id,
            event_id = %event.id,
            event_type = %event.event_type,
            "Webhook verified"
        );

        Ok(event)
    }
}

#[async_trait::async_trait]
impl Integration for StripeIntegration {
    type Config = StripeConfig;

    fn descriptor(&self) -> &IntegrationDescriptor {
        &self.descriptor
    }

    fn validate_config(&self, config: &StripeConfig) -> Result<()> {
        config.validate()?;

        if let Some(secret) = &config.webhook_secret
            && !secret.starts_with("whsec_")
        {
            let mut errors = ValidationErrors::new();
            errors.add("webhook_secret", ValidationError::new("webhook_secret_prefix"));
            return Err(errors.into());
        }

        Ok(())
    }

    fn credential_headers(&self, config: &StripeConfig) -> HashMap<String, String> {
        HashMap::from([(
            "Authorization".to_owned(),
            format!("Bearer {}", config.secret_key),
        )])
    }

    async fn test_connection(&self, config: &StripeConfig) -> Result<ConnectionHealth> {
        let body = self
            .gateway
            .probe(self, config, GatewayRequest::get("/balance"))
            .await?;

        let livemode = body
            .get("livemode")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(!config.is_test_mode());
        Ok(ConnectionHealth::healthy().with_metric("livemode", livemode.into()))
    }
}
