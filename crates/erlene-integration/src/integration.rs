//! Capability interface implemented by every concrete integration.

use std::collections::HashMap;
use std::time::Instant;

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::gateway::TRACING_TARGET;
use crate::{ConnectionHealth, ErrorKind, IntegrationDescriptor, Result};

/// A third-party service reached through the gateway.
///
/// Implementations are plain values composed with a shared
/// [`IntegrationGateway`](crate::IntegrationGateway) handed in at
/// construction; they carry no retry or bookkeeping logic of their own.
#[async_trait::async_trait]
pub trait Integration: Send + Sync {
    /// Typed credentials decoded from the profile's configuration blob.
    type Config: DeserializeOwned + Validate + Send + Sync;

    /// Name, endpoint and call settings.
    fn descriptor(&self) -> &IntegrationDescriptor;

    /// Integration name, the profile lookup key.
    fn name(&self) -> &str {
        self.descriptor().name()
    }

    /// Checks that every required credential is present and well formed.
    fn validate_config(&self, config: &Self::Config) -> Result<()> {
        config.validate().map_err(Into::into)
    }

    /// Headers that authenticate requests made with this configuration.
    fn credential_headers(&self, config: &Self::Config) -> HashMap<String, String>;

    /// Issues a cheap authenticated request to verify the credentials.
    async fn test_connection(&self, config: &Self::Config) -> Result<ConnectionHealth>;

    /// Decodes and validates a raw configuration blob.
    fn parse_config(&self, blob: &serde_json::Value) -> Result<Self::Config> {
        let config: Self::Config = serde_json::from_value(blob.clone())
            .map_err(|e| crate::Error::from(e).with_context(self.name().to_owned()))?;
        self.validate_config(&config)?;
        Ok(config)
    }
}

/// Validates a configuration and tests the connection, folding every failure
/// into the returned report.
pub async fn verify_connection<I>(integration: &I, blob: &serde_json::Value) -> ConnectionHealth
where
    I: Integration + ?Sized,
{
    let config = match integration.parse_config(blob) {
        Ok(config) => config,
        Err(error) => {
            tracing::info!(
                target: TRACING_TARGET,
                integration = integration.name(),
                error = %error,
                "Configuration rejected"
            );
            return ConnectionHealth::misconfigured(error.message.unwrap_or_default());
        }
    };

    let started_at = Instant::now();
    let result = integration.test_connection(&config).await;
    let elapsed = started_at.elapsed();

    match result {
        Ok(health) => health.with_response_time(elapsed),
        Err(error) if error.kind == ErrorKind::ConfigValidation => {
            ConnectionHealth::misconfigured(error.message.unwrap_or_default())
        }
        Err(error) => {
            let mut health =
                ConnectionHealth::unreachable(error.message.clone().unwrap_or_default())
                    .with_response_time(elapsed);
            if let Some(attempts) = error.attempts {
                health = health.with_metric("attempts", attempts.into());
            }
            health
        }
    }
}
