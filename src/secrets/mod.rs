//! Secret store access and the startup credential set

mod gcp;
#[cfg(test)]
mod memory;

use async_trait::async_trait;

use crate::config::SecretsConfig;

pub use gcp::GcpSecretManager;
#[cfg(test)]
pub use memory::MemorySecretStore;

/// Keyed lookup of secret values: (project, name, version) -> UTF-8 string
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch one version of a named secret
    async fn access(&self, project: &str, name: &str, version: &str) -> Result<String, SecretError>;

    /// Name of the backend (for logging)
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Permission denied for secret: {0}")]
    PermissionDenied(String),

    #[error("Secret store authentication failed: {0}")]
    Auth(String),

    #[error("Secret store API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode secret payload: {0}")]
    Decode(String),
}

/// Credentials loaded once at startup and read by every request
///
/// A field is `None` when loading failed; routes that need it answer with a
/// configuration error instead of calling upstream.
#[derive(Clone, Default)]
pub struct Credentials {
    pub ai_provider_key: Option<String>,
    pub platform_key: Option<String>,
    pub platform_secret: Option<String>,
}

impl Credentials {
    pub fn new(
        ai_provider_key: impl Into<String>,
        platform_key: impl Into<String>,
        platform_secret: impl Into<String>,
    ) -> Self {
        Self {
            ai_provider_key: Some(ai_provider_key.into()),
            platform_key: Some(platform_key.into()),
            platform_secret: Some(platform_secret.into()),
        }
    }

    pub fn ai_provider_key(&self) -> Option<&str> {
        self.ai_provider_key.as_deref()
    }

    /// LiveKit key and secret, only when both are present
    pub fn platform_pair(&self) -> Option<(&str, &str)> {
        match (&self.platform_key, &self.platform_secret) {
            (Some(key), Some(secret)) => Some((key.as_str(), secret.as_str())),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.ai_provider_key.is_some() && self.platform_pair().is_some()
    }
}

// Secret values never reach logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<set>" } else { "<absent>" };
        f.debug_struct("Credentials")
            .field("ai_provider_key", &redact(&self.ai_provider_key))
            .field("platform_key", &redact(&self.platform_key))
            .field("platform_secret", &redact(&self.platform_secret))
            .finish()
    }
}

/// Fetch all three credentials, or none of them
pub async fn try_load_credentials(
    store: &dyn SecretStore,
    config: &SecretsConfig,
) -> Result<Credentials, SecretError> {
    let project = config.project_id.as_str();
    let version = config.version.as_str();

    let ai_provider_key = store.access(project, &config.openai_api_key_secret, version).await?;
    let platform_key = store.access(project, &config.livekit_api_key_secret, version).await?;
    let platform_secret = store.access(project, &config.livekit_api_secret_secret, version).await?;

    Ok(Credentials::new(ai_provider_key, platform_key, platform_secret))
}

/// Startup loading: any failure is logged and leaves every credential absent
pub async fn load_credentials(store: &dyn SecretStore, config: &SecretsConfig) -> Credentials {
    match try_load_credentials(store, config).await {
        Ok(credentials) => {
            tracing::info!(store = store.name(), project = %config.project_id, "Secrets loaded successfully");
            credentials
        }
        Err(e) => {
            tracing::error!(
                store = store.name(),
                project = %config.project_id,
                error = %e,
                "Failed to load secrets, credential-dependent routes are disabled"
            );
            Credentials::default()
        }
    }
}
