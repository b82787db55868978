//! Document storage through the Google Drive v3 API.

use std::collections::HashMap;

use erlene_integration::{
    ConnectionHealth, GatewayRequest, Integration, IntegrationDescriptor, IntegrationGateway,
    Result, TenantId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

/// Integration name used for profile lookups.
pub const INTEGRATION_NAME: &str = "google_drive";

/// Drive v3 API endpoint.
pub const BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Tracing target for document storage operations.
pub const TRACING_TARGET: &str = "erlene_connectors::google_drive";

/// MIME type Drive assigns to folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

const FILE_FIELDS: &str = "files(id,name,mimeType,modifiedTime),nextPageToken";

/// OAuth credentials for a Drive account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GoogleDriveConfig {
    #[validate(length(min = 1))]
    pub client_id: String,
    #[validate(length(min = 1))]
    pub client_secret: String,
    #[validate(length(min = 1))]
    pub access_token: String,
    /// Folder new documents are filed under when no parent is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder_id: Option<String>,
}

/// Document storage.
#[derive(Debug, Clone)]
pub struct GoogleDriveIntegration {
    descriptor: IntegrationDescriptor,
    gateway: IntegrationGateway,
}

impl GoogleDriveIntegration {
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

    /// Lists the files in a folder, skipping trashed entries.
    pub async fn list_files(
        &self,
        tenant_id: TenantId,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut query = json!({
            "q": format!("'{}' in parents and trashed = false", escape_query(folder_id)),
            "fields": FILE_FIELDS,
        });
        if let Some(token) = page_token {
            query["pageToken"] = token.into();
        }

        let request = GatewayRequest::get("/files")
            .with_payload(query)
            .with_tenant(tenant_id);
        self.gateway.execute(self, request).await
    }

    /// Creates a folder, under `parent_id` when given.
    pub async fn create_folder(
        &self,
        tenant_id: TenantId,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut body = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
        });
        if let Some(parent) = parent_id {
            body["parents"] = json!([parent]);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            tenant_id = %tenant_id,
            name = %name,
            "Creating folder"
        );

        let request = GatewayRequest::post("/files")
            .with_payload(body)
            .with_tenant(tenant_id);
        self.gateway.execute(self, request).await
    }
}

/// Escapes single quotes and backslashes inside a Drive query literal.
fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait::async_trait]
impl Integration for GoogleDriveIntegration {
    type Config = GoogleDriveConfig;

    fn descriptor(&self) -> &IntegrationDescriptor {
        &self.descriptor
    }

    fn credential_headers(&self, config: &GoogleDriveConfig) -> HashMap<String, String> {
        HashMap::from([(
            "Authorization".to_owned(),
            format!("Bearer {}", config.access_token),
        )])
    }

    async fn test_connection(&self, config: &GoogleDriveConfig) -> Result<ConnectionHealth> {
        let request = GatewayRequest::get("/about").with_payload(json!({"fields": "user"}));
        let body = self.gateway.probe(self, config, request).await?;

        let mut health = ConnectionHealth::healthy();
        if let Some(email) = body.pointer("/user/emailAddress") {
            health = health.with_metric("account", email.clone());
        }
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use erlene_integration::mock::{MockTransport, RecordingSleeper};
    use erlene_integration::{
        ErrorKind, IntegrationProfile, MemoryProfileStore, TransportError, TransportResponse,
    };

    use super::*;

    fn setup(transport: MockTransport, store: MemoryProfileStore) -> GoogleDriveIntegration {
        let gateway =
            IntegrationGateway::new(transport, store).with_sleeper(RecordingSleeper::new());
        GoogleDriveIntegration::new(gateway).unwrap()
    }

    fn store() -> MemoryProfileStore {
        MemoryProfileStore::from_profiles([IntegrationProfile::new(
            INTEGRATION_NAME,
            TenantId::new(1),
            json!({
                "client_id": "id",
                "client_secret": "secret",
                "access_token": "ya29.token",
            }),
        )])
    }

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query("plain"), "plain");
        assert_eq!(escape_query("o'brien"), "o\\'brien");
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let drive = setup(MockTransport::new(), MemoryProfileStore::new());
        let error = drive
            .parse_config(&json!({"client_id": "id", "client_secret": "secret", "access_token": ""}))
            .unwrap_err();

        assert_eq!(error.kind, ErrorKind::ConfigValidation);
        assert!(error.message.unwrap().contains("access_token"));
    }

    #[tokio::test]
    async fn test_list_files_sends_query() {
        let transport = MockTransport::always(TransportResponse::json(200, &json!({"files": []})));
        let drive = setup(transport.clone(), store());

        let body = drive
            .list_files(TenantId::new(1), "folder-1", Some("next"))
            .await
            .unwrap();
        assert_eq!(body, json!({"files": []}));

        let sent = &transport.requests()[0];
        assert_eq!(sent.url.as_str(), "https://www.googleapis.com/drive/v3/files");
        assert_eq!(sent.headers["Authorization"], "Bearer ya29.token");

        let query = sent.query().unwrap();
        assert_eq!(query["q"], "'folder-1' in parents and trashed = false");
        assert_eq!(query["pageToken"], "next");
    }

    #[tokio::test]
    async fn test_create_folder_retries_then_succeeds() {
        let transport = MockTransport::new()
            .then_fail(TransportError::timeout("timed out"))
            .then_respond(TransportResponse::json(200, &json!({"id": "f1"})));
        let sleeper = RecordingSleeper::new();
        let gateway = IntegrationGateway::new(transport.clone(), store()).with_sleeper(sleeper.clone());
        let drive = GoogleDriveIntegration::new(gateway).unwrap();

        let body = drive
            .create_folder(TenantId::new(1), "Processo 123", Some("root"))
            .await
            .unwrap();

        assert_eq!(body["id"], "f1");
        assert_eq!(transport.call_count(), 2);
        assert_eq!(sleeper.delays().len(), 1);

        let sent = transport.requests().pop().unwrap();
        let payload = sent.body().unwrap();
        assert_eq!(payload["mimeType"], FOLDER_MIME_TYPE);
        assert_eq!(payload["parents"], json!(["root"]));
    }

    #[tokio::test]
    async fn test_connection_reports_account() {
        let transport = MockTransport::always(TransportResponse::json(
            200,
            &json!({"user": {"emailAddress": "office@example.com"}}),
        ));
        let drive = setup(transport.clone(), MemoryProfileStore::new());
        let config = drive
            .parse_config(&json!({"client_id": "id", "client_secret": "s", "access_token": "t"}))
            .unwrap();

        let health = drive.test_connection(&config).await.unwrap();

        assert!(health.is_healthy());
        assert_eq!(health.metrics["account"], "office@example.com");
        assert_eq!(transport.requests()[0].query().unwrap()["fields"], "user");
    }
}
