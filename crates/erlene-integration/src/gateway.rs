//! Shared gateway for every outbound integration call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::attempt::{AttemptError, AttemptOutcome, RequestAttempt};
use crate::retry::{Sleeper, TokioSleeper};
use crate::store::ProfileStore;
use crate::transport::{HttpTransport, TransportRequest};
use crate::{
    CallOutcome, Error, GatewayRequest, HttpMethod, Integration, IntegrationDescriptor, Result,
    TenantId,
};

/// Tracing target for gateway operations.
pub const TRACING_TARGET: &str = "erlene_integration::gateway";

/// Issues outbound integration calls with bounded retries and records
/// per-tenant outcomes.
///
/// Cloning is cheap; clones share the transport, profile store and sleeper.
/// Each call runs its retry loop on the calling task; the backoff delay is
/// its only suspension point besides the request itself.
///
/// # Examples
///
/// ```rust,ignore
/// use erlene_integration::{GatewayRequest, IntegrationGateway, MemoryProfileStore, TenantId};
///
/// let gateway = IntegrationGateway::new(transport, MemoryProfileStore::new());
/// let request = GatewayRequest::get("/processos/123").with_tenant(TenantId::new(7));
/// let body = gateway.execute(&court_lookup, request).await?;
/// ```
#[derive(Clone)]
pub struct IntegrationGateway {
    transport: Arc<dyn HttpTransport>,
    profiles: Arc<dyn ProfileStore>,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for IntegrationGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationGateway")
            .field("sleeper", &self.sleeper)
            .finish_non_exhaustive()
    }
}

/// Everything one retry loop needs, resolved before the first attempt.
struct PreparedCall<'a> {
    request_id: Uuid,
    descriptor: &'a IntegrationDescriptor,
    method_name: &'a str,
    tenant_id: Option<TenantId>,
    request: TransportRequest,
}

impl IntegrationGateway {
    /// Creates a gateway that sleeps on the tokio timer between attempts.
    pub fn new<T, S>(transport: T, profiles: S) -> Self
    where
        T: HttpTransport + 'static,
        S: ProfileStore + 'static,
    {
        Self::from_parts(Arc::new(transport), Arc::new(profiles), Arc::new(TokioSleeper))
    }

    /// Creates a gateway from shared components.
    pub fn from_parts(
        transport: Arc<dyn HttpTransport>,
        profiles: Arc<dyn ProfileStore>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            transport,
            profiles,
            sleeper,
        }
    }

    /// Replaces the backoff sleeper.
    #[must_use]
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Returns the profile store.
    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    /// Executes a call on behalf of `integration`.
    ///
    /// With a tenant, the tenant's profile must exist and be active; its
    /// configuration supplies credential headers and its counters receive
    /// exactly one update when the sequence completes. Without a tenant only
    /// default and custom headers are sent and no counters change.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidMethod`](crate::ErrorKind::InvalidMethod) for an
    ///   unsupported verb, before any lookup or request.
    /// - [`ErrorKind::NotConfigured`](crate::ErrorKind::NotConfigured) when
    ///   the tenant has no active profile.
    /// - [`ErrorKind::ConfigValidation`](crate::ErrorKind::ConfigValidation)
    ///   when the stored configuration does not decode.
    /// - [`ErrorKind::RequestExhausted`](crate::ErrorKind::RequestExhausted)
    ///   when every attempt failed.
    pub async fn execute<I>(&self, integration: &I, request: GatewayRequest) -> Result<serde_json::Value>
    where
        I: Integration + ?Sized,
    {
        let descriptor = integration.descriptor();
        let request_id = Uuid::now_v7();
        let method = self.parse_method(request_id, descriptor, &request)?;

        let credentials = match request.tenant_id {
            Some(tenant_id) => {
                self.load_credentials(request_id, integration, &request, tenant_id)
                    .await?
            }
            None => HashMap::new(),
        };

        let prepared = self.prepare(request_id, descriptor, method, &request, credentials)?;
        let result = self.run(&prepared).await;

        if let Some(tenant_id) = request.tenant_id {
            let outcome = match &result {
                Ok(_) => CallOutcome::Succeeded,
                Err(error) => CallOutcome::Failed(error.message.clone().unwrap_or_default()),
            };
            self.record(descriptor.name(), tenant_id, &outcome).await;
        }

        result
    }

    /// Executes a call with an explicit configuration and no tenant.
    ///
    /// Used to verify credentials before a profile is activated: the retry
    /// loop is the same as [`execute`](Self::execute), but no profile is read
    /// and no counters change.
    pub async fn probe<I>(
        &self,
        integration: &I,
        config: &I::Config,
        request: GatewayRequest,
    ) -> Result<serde_json::Value>
    where
        I: Integration + ?Sized,
    {
        let descriptor = integration.descriptor();
        let request_id = Uuid::now_v7();
        let method = self.parse_method(request_id, descriptor, &request)?;
        let credentials = integration.credential_headers(config);

        let prepared = self.prepare(request_id, descriptor, method, &request, credentials)?;
        self.run(&prepared).await
    }

    fn parse_method(
        &self,
        request_id: Uuid,
        descriptor: &IntegrationDescriptor,
        request: &GatewayRequest,
    ) -> Result<HttpMethod> {
        HttpMethod::parse(&request.method).inspect_err(|error| {
            abort(request_id, descriptor, request, error);
        })
    }

    async fn load_credentials<I>(
        &self,
        request_id: Uuid,
        integration: &I,
        request: &GatewayRequest,
        tenant_id: TenantId,
    ) -> Result<HashMap<String, String>>
    where
        I: Integration + ?Sized,
    {
        let descriptor = integration.descriptor();
        let profile = self
            .profiles
            .find(descriptor.name(), tenant_id)
            .await
            .inspect_err(|error| abort(request_id, descriptor, request, error))?;

        let Some(profile) = profile.filter(|profile| profile.is_active) else {
            let error = Error::not_configured(descriptor.name(), tenant_id);
            abort(request_id, descriptor, request, &error);
            return Err(error);
        };

        let config = integration
            .parse_config(&profile.config)
            .inspect_err(|error| abort(request_id, descriptor, request, error))?;

        Ok(integration.credential_headers(&config))
    }

    fn prepare<'a>(
        &self,
        request_id: Uuid,
        descriptor: &'a IntegrationDescriptor,
        method: HttpMethod,
        request: &'a GatewayRequest,
        credentials: HashMap<String, String>,
    ) -> Result<PreparedCall<'a>> {
        let url = descriptor
            .endpoint(&request.path)
            .inspect_err(|error| abort(request_id, descriptor, request, error))?;

        let mut headers = descriptor.default_headers().clone();
        headers.extend(credentials);
        headers.extend(request.headers.clone());

        Ok(PreparedCall {
            request_id,
            descriptor,
            method_name: &request.method,
            tenant_id: request.tenant_id,
            request: TransportRequest {
                method,
                url,
                headers,
                payload: request.payload.clone(),
                timeout: request.timeout.unwrap_or_else(|| descriptor.timeout()),
            },
        })
    }

    /// Runs the attempt loop: `Attempting(n) -> Success | Attempting(n+1) | Exhausted`.
    async fn run(&self, call: &PreparedCall<'_>) -> Result<serde_json::Value> {
        let policy = call.descriptor.retry();
        let max_attempts = policy.max_attempts();
        let mut attempt = 1;

        loop {
            let result = self.attempt(&call.request).await;

            let mut record = RequestAttempt {
                request_id: call.request_id,
                integration: call.descriptor.name(),
                method: call.method_name,
                url: Some(&call.request.url),
                tenant_id: call.tenant_id,
                attempt,
                max_attempts,
                outcome: AttemptOutcome::Success,
                error: None,
            };

            match result {
                Ok(body) => {
                    record.emit();
                    return Ok(body);
                }
                Err(error) => {
                    let message = error.to_string();
                    record.outcome = AttemptOutcome::TransientFailure;
                    record.error = Some(message.clone());
                    record.emit();

                    if !policy.has_next(attempt) {
                        tracing::error!(
                            target: TRACING_TARGET,
                            request_id = %call.request_id,
                            integration = call.descriptor.name(),
                            url = %call.request.url,
                            attempts = attempt,
                            error = %message,
                            "Integration request exhausted its attempts"
                        );
                        return Err(Error::request_exhausted(attempt, message)
                            .with_context(call.descriptor.name().to_owned()));
                    }

                    let delay = policy.delay_for(attempt);
                    tracing::debug!(
                        target: TRACING_TARGET,
                        request_id = %call.request_id,
                        attempt,
                        backoff_ms = delay.as_millis(),
                        "Retrying integration request after backoff"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<serde_json::Value, AttemptError> {
        let response = self
            .transport
            .send(request)
            .await
            .map_err(AttemptError::Transport)?;

        if !response.is_success() {
            return Err(AttemptError::status(response.status, &response));
        }

        response.decode().map_err(AttemptError::Decode)
    }

    async fn record(&self, integration: &str, tenant_id: TenantId, outcome: &CallOutcome) {
        if let Err(error) = self.profiles.record(integration, tenant_id, outcome).await {
            tracing::warn!(
                target: TRACING_TARGET,
                integration,
                tenant_id = %tenant_id,
                error = %error,
                "Failed to record integration outcome"
            );
        }
    }
}

/// Logs a sequence that ended before any request was sent.
fn abort(
    request_id: Uuid,
    descriptor: &IntegrationDescriptor,
    request: &GatewayRequest,
    error: &Error,
) {
    RequestAttempt {
        request_id,
        integration: descriptor.name(),
        method: &request.method,
        url: None,
        tenant_id: request.tenant_id,
        attempt: 1,
        max_attempts: descriptor.retry().max_attempts(),
        outcome: AttemptOutcome::FatalFailure,
        error: Some(error.to_string()),
    }
    .emit();
}
