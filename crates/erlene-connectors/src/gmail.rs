//! Outbound email through the Gmail v1 API.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use erlene_integration::{
    ConnectionHealth, Error, ErrorKind, GatewayRequest, Integration, IntegrationDescriptor,
    IntegrationGateway, Result, TenantId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::{Validate, ValidateEmail};

/// Integration name used for profile lookups.
pub const INTEGRATION_NAME: &str = "gmail";

/// Gmail v1 API endpoint.
pub const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Tracing target for email operations.
pub const TRACING_TARGET: &str = "erlene_connectors::gmail";

/// OAuth credentials and sender address for a Gmail account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GmailConfig {
    #[validate(length(min = 1))]
    pub client_id: String,
    #[validate(length(min = 1))]
    pub client_secret: String,
    #[validate(length(min = 1))]
    pub access_token: String,
    /// Address messages are sent from.
    #[validate(email)]
    pub sender: String,
}

/// A plain-text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Creates a message to a single recipient.
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn with_recipient(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    /// Renders the message as RFC 2822 text.
    ///
    /// The `From` header is left out; Gmail fills it in with the
    /// authenticated account.
    pub fn to_rfc2822(&self) -> Result<String> {
        if self.to.is_empty() {
            return Err(Error::new(ErrorKind::InvalidRequest).with_message("message has no recipients"));
        }
        if let Some(invalid) = self.to.iter().find(|address| !address.validate_email()) {
            return Err(Error::new(ErrorKind::InvalidRequest)
                .with_message(format!("'{invalid}' is not an email address")));
        }
        if self.subject.contains(['\r', '\n']) {
            return Err(Error::new(ErrorKind::InvalidRequest)
                .with_message("subject must be a single line"));
        }

        Ok(format!(
            "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\nContent-Transfer-Encoding: base64\r\n\r\n{}",
            self.to.join(", "),
            encode_header(&self.subject),
            STANDARD.encode(self.body.as_bytes()),
        ))
    }

    /// Encodes the message as the `raw` field Gmail expects.
    pub fn to_raw(&self) -> Result<String> {
        Ok(URL_SAFE_NO_PAD.encode(self.to_rfc2822()?.as_bytes()))
    }
}

/// Longest input run per encoded word. 45 bytes become 60 base64 chars,
/// which keeps each `=?UTF-8?B?...?=` word within the 75 char limit.
const ENCODED_WORD_BYTES: usize = 45;

/// Encodes non-ASCII header text as folded RFC 2047 encoded words.
///
/// Words never split a UTF-8 sequence.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        return value.to_owned();
    }

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (index, c) in value.char_indices() {
        let next = index + c.len_utf8();
        if next - start > ENCODED_WORD_BYTES {
            words.push(encoded_word(&value[start..end]));
            start = end;
        }
        end = next;
    }
    words.push(encoded_word(&value[start..end]));

    words.join("\r\n ")
}

fn encoded_word(chunk: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(chunk.as_bytes()))
}

/// Outbound email.
#[derive(Debug, Clone)]
pub struct GmailIntegration {
    descriptor: IntegrationDescriptor,
    gateway: IntegrationGateway,
}

impl GmailIntegration {
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

    /// Sends a message from the tenant's account.
    pub async fn send_message(
        &self,
        tenant_id: TenantId,
        message: &EmailMessage,
    ) -> Result<serde_json::Value> {
        let raw = message.to_raw()?;

        tracing::debug!(
            target: TRACING_TARGET,
            tenant_id = %tenant_id,
            recipients = message.to.len(),
            "Sending message"
        );

        let request = GatewayRequest::post("/users/me/messages/send")
            .with_payload(json!({ "raw": raw }))
            .with_tenant(tenant_id);
        self.gateway.execute(self, request).await
    }
}

#[async_trait::async_trait]
impl Integration for GmailIntegration {
    type Config = GmailConfig;

    fn descriptor(&self) -> &IntegrationDescriptor {
        &self.descriptor
    }

    fn credential_headers(&self, config: &GmailConfig) -> HashMap<String, String> {
        HashMap::from([(
            "Authorization".to_owned(),
            format!("Bearer {}", config.access_token),
        )])
    }

    async fn test_connection(&self, config: &GmailConfig) -> Result<ConnectionHealth> {
        let body = self
            .gateway
            .probe(self, config, GatewayRequest::get("/users/me/profile"))
            .await?;

        let account = body
            .get("emailAddress")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        let mut health = ConnectionHealth::healthy().with_metric("account", account.into());
        if !account.eq_ignore_ascii_case(&config.sender) {
            health.message = Some(format!(
                "token belongs to {account}, not the configured sender {}",
                config.sender
            ));
        }
        Ok(health)
    }
}
