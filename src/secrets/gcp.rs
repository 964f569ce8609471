//! Google Cloud Secret Manager backend (REST v1)
//!
//! Secret path mapping:
//! ```text
//! (shrink-1, openai-api-key, latest)
//!   -> {endpoint}/v1/projects/shrink-1/secrets/openai-api-key/versions/latest:access
//! ```
//!
//! Authentication uses an OAuth access token taken from the environment when
//! present, otherwise from the GCE / Cloud Run metadata server.

use async_trait::async_trait;
use base64::Engine;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use super::{SecretError, SecretStore};
use crate::config::SecretsConfig;

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// [`SecretStore`] backed by Google Cloud Secret Manager
pub struct GcpSecretManager {
    client: Client,
    endpoint: String,
    metadata_token_url: String,
    /// Token supplied up front; skips the metadata server when set
    static_token: Option<String>,
}

impl GcpSecretManager {
    pub fn new(client: Client, endpoint: impl Into<String>, metadata_token_url: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            metadata_token_url: metadata_token_url.into(),
            static_token: None,
        }
    }

    /// Build from configuration, picking up an access token from the environment
    pub fn from_config(client: Client, config: &SecretsConfig) -> Self {
        let store = Self::new(client, config.base_url(), config.metadata_token_url.clone());
        match std::env::var(&config.access_token_env) {
            Ok(token) if !token.trim().is_empty() => {
                tracing::debug!(env = %config.access_token_env, "Using access token from environment");
                store.with_access_token(token.trim())
            }
            _ => store,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.static_token = Some(token.into());
        self
    }

    fn version_url(&self, project: &str, name: &str, version: &str) -> String {
        format!(
            "{}/v1/projects/{}/secrets/{}/versions/{}:access",
            self.endpoint, project, name, version
        )
    }

    async fn access_token(&self) -> Result<String, SecretError> {
        if let Some(ref token) = self.static_token {
            return Ok(token.clone());
        }

        let resp = self
            .client
            .get(&self.metadata_token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| SecretError::Auth(format!("metadata server unreachable: {}", e)))?;

        if !resp.status().is_success() {
            return Err(SecretError::Auth(format!(
                "metadata server returned {}",
                resp.status()
            )));
        }

        let token: MetadataToken = resp
            .json()
            .await
            .map_err(|e| SecretError::Auth(format!("malformed metadata token response: {}", e)))?;
        Ok(token.access_token)
    }
}

/// Extract `error.message` from a Google API error body
async fn api_error_message(resp: reqwest::Response) -> String {
    resp.json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v.pointer("/error/message")?.as_str().map(String::from))
        .unwrap_or_default()
}

fn decode_payload(data: &str) -> Result<String, SecretError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| SecretError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SecretError::Decode(e.to_string()))
}

#[async_trait]
impl SecretStore for GcpSecretManager {
    async fn access(&self, project: &str, name: &str, version: &str) -> Result<String, SecretError> {
        let token = self.access_token().await?;
        let url = self.version_url(project, name, version);
        let secret_path = format!("projects/{}/secrets/{}/versions/{}", project, name, version);

        tracing::debug!(secret = %secret_path, "Accessing secret version");

        let resp = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;

        match resp.status() {
            status if status.is_success() => {
                let body: AccessSecretVersionResponse = resp
                    .json()
                    .await
                    .map_err(|e| SecretError::Decode(e.to_string()))?;
                decode_payload(&body.payload.data)
            }
            StatusCode::NOT_FOUND => Err(SecretError::NotFound(secret_path)),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(SecretError::PermissionDenied(secret_path)),
            status => Err(SecretError::Api {
                status: status.as_u16(),
                message: api_error_message(resp).await,
            }),
        }
    }

    fn name(&self) -> &str {
        "gcp-secret-manager"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_url() {
        let store = GcpSecretManager::new(Client::new(), "https://secretmanager.googleapis.com/", "http://metadata");
        assert_eq!(
            store.version_url("shrink-1", "openai-api-key", "latest"),
            "https://secretmanager.googleapis.com/v1/projects/shrink-1/secrets/openai-api-key/versions/latest:access"
        );
    }

    #[test]
    fn test_decode_payload() {
        // "sk-test" in standard base64
        assert_eq!(decode_payload("c2stdGVzdA==").unwrap(), "sk-test");
    }

    #[test]
    fn test_decode_payload_rejects_garbage() {
        assert!(matches!(decode_payload("!!not base64!!"), Err(SecretError::Decode(_))));
    }

    #[test]
    fn test_decode_payload_rejects_invalid_utf8() {
        // 0xff 0xfe
        assert!(matches!(decode_payload("//4="), Err(SecretError::Decode(_))));
    }

    #[tokio::test]
    async fn test_static_token_skips_metadata_server() {
        let store = GcpSecretManager::new(Client::new(), "http://127.0.0.1:1", "http://127.0.0.1:1/token")
            .with_access_token("ya29.token");
        assert_eq!(store.access_token().await.unwrap(), "ya29.token");
    }
}
