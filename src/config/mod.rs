mod loader;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use loader::load_config;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub livekit: LiveKitConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// Gateway listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Upper bound for request bodies (audio uploads are the largest)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Google Cloud Secret Manager configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecretsConfig {
    #[serde(default = "default_project_id")]
    pub project_id: String,
    /// Version qualifier applied to every secret
    #[serde(default = "default_secret_version")]
    pub version: String,
    #[serde(default = "default_secrets_endpoint")]
    pub endpoint: String,
    /// Environment variable holding a ready-made OAuth access token
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    /// Metadata server URL used when no access token is in the environment
    #[serde(default = "default_metadata_token_url")]
    pub metadata_token_url: String,
    #[serde(default = "default_openai_api_key_secret")]
    pub openai_api_key_secret: String,
    #[serde(default = "default_livekit_api_key_secret")]
    pub livekit_api_key_secret: String,
    #[serde(default = "default_livekit_api_secret_secret")]
    pub livekit_api_secret_secret: String,
}

fn default_project_id() -> String {
    "shrink-1".to_string()
}

fn default_secret_version() -> String {
    "latest".to_string()
}

fn default_secrets_endpoint() -> String {
    "https://secretmanager.googleapis.com".to_string()
}

fn default_access_token_env() -> String {
    "GOOGLE_OAUTH_ACCESS_TOKEN".to_string()
}

fn default_metadata_token_url() -> String {
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
        .to_string()
}

fn default_openai_api_key_secret() -> String {
    "openai-api-key".to_string()
}

fn default_livekit_api_key_secret() -> String {
    "livekit-api-key".to_string()
}

fn default_livekit_api_secret_secret() -> String {
    "livekit-api-secret".to_string()
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            version: default_secret_version(),
            endpoint: default_secrets_endpoint(),
            access_token_env: default_access_token_env(),
            metadata_token_url: default_metadata_token_url(),
            openai_api_key_secret: default_openai_api_key_secret(),
            livekit_api_key_secret: default_livekit_api_key_secret(),
            livekit_api_secret_secret: default_livekit_api_secret_secret(),
        }
    }
}

impl SecretsConfig {
    /// Returns the endpoint with trailing slash stripped
    pub fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }
}

/// LiveKit access token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LiveKitConfig {
    /// Room every issued token grants join access to
    #[serde(default = "default_room")]
    pub room: String,
}

fn default_room() -> String {
    "my-conversation-room".to_string()
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            room: default_room(),
        }
    }
}

/// OpenAI upstream configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    #[serde(default = "default_voice")]
    pub voice: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4.1".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_transcription_model() -> String {
    "gpt-4o-mini-transcribe".to_string()
}

fn default_speech_model() -> String {
    "gpt-4o-mini-tts".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            chat_model: default_chat_model(),
            system_prompt: default_system_prompt(),
            transcription_model: default_transcription_model(),
            speech_model: default_speech_model(),
            voice: default_voice(),
        }
    }
}

impl OpenAiConfig {
    /// Returns the base URL with trailing slash stripped
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        load_config(path)
    }

    /// Load configuration, falling back to built-in defaults
    ///
    /// An explicit path must exist. Without one, the usual locations are
    /// tried and the defaults are used when none of them exists.
    pub fn load_or_default(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => Self::from_file(path),
            None => {
                let default_paths = ["config.yaml", "config.yml", "./config/config.yaml"];
                for p in default_paths {
                    let path = Path::new(p);
                    if path.exists() {
                        return Self::from_file(path);
                    }
                }
                tracing::debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply overrides from the process environment (`PORT`)
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_port_override(std::env::var("PORT").ok().as_deref())
    }

    fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), ConfigError> {
        if let Some(raw) = port {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("invalid PORT value: {:?}", raw)))?;
        }
        Ok(())
    }

    /// Check values that would otherwise only fail on first use
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("openai.base_url", self.openai.base_url.as_str()),
            ("secrets.endpoint", self.secrets.endpoint.as_str()),
            ("secrets.metadata_token_url", self.secrets.metadata_token_url.as_str()),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::Validation(format!("{} is not a valid URL: {}", field, e)))?;
        }

        for (field, value) in [
            ("livekit.room", &self.livekit.room),
            ("secrets.project_id", &self.secrets.project_id),
            ("secrets.version", &self.secrets.version),
            ("secrets.openai_api_key_secret", &self.secrets.openai_api_key_secret),
            ("secrets.livekit_api_key_secret", &self.secrets.livekit_api_key_secret),
            ("secrets.livekit_api_secret_secret", &self.secrets.livekit_api_secret_secret),
            ("openai.chat_model", &self.openai.chat_model),
            ("openai.transcription_model", &self.openai.transcription_model),
            ("openai.speech_model", &self.openai.speech_model),
            ("openai.voice", &self.openai.voice),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{} must not be empty", field)));
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_constants() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.secrets.project_id, "shrink-1");
        assert_eq!(config.secrets.version, "latest");
        assert_eq!(config.livekit.room, "my-conversation-room");
        assert_eq!(config.openai.chat_model, "gpt-4.1");
        assert_eq!(config.openai.system_prompt, "You are a helpful assistant.");
        assert_eq!(config.openai.transcription_model, "gpt-4o-mini-transcribe");
        assert_eq!(config.openai.speech_model, "gpt-4o-mini-tts");
        assert_eq!(config.openai.voice, "alloy");
    }

    #[test]
    fn test_openai_base_url_trailing_slash() {
        let config = OpenAiConfig {
            base_url: "http://localhost:9000/v1/".to_string(),
            ..OpenAiConfig::default()
        };
        assert_eq!(config.base_url(), "http://localhost:9000/v1");
    }

    #[test]
    fn test_secrets_base_url_trailing_slash() {
        let config = SecretsConfig {
            endpoint: "http://localhost:9001/".to_string(),
            ..SecretsConfig::default()
        };
        assert_eq!(config.base_url(), "http://localhost:9001");
    }

    #[test]
    fn test_port_override() {
        let mut config = AppConfig::default();
        config.apply_port_override(Some("9090")).unwrap();
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_port_override_absent_keeps_config() {
        let mut config = AppConfig::default();
        config.server.port = 7000;
        config.apply_port_override(None).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_port_override_invalid() {
        let mut config = AppConfig::default();
        let err = config.apply_port_override(Some("eighty")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_validate_defaults() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = AppConfig::default();
        config.openai.base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("openai.base_url"));
    }

    #[test]
    fn test_validate_rejects_empty_room() {
        let mut config = AppConfig::default();
        config.livekit.room = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("livekit.room"));
    }

    #[test]
    fn test_load_or_default_with_missing_path() {
        let result = AppConfig::load_or_default(Some(Path::new("/nonexistent/config.yaml")));
        assert!(matches!(result.unwrap_err(), ConfigError::NotFound(_)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NotFound("test.yaml".to_string());
        assert!(err.to_string().contains("test.yaml"));

        let err = ConfigError::Parse(serde_yaml::from_str::<AppConfig>("- a list").unwrap_err());
        assert!(err.to_string().contains("parse"));
    }
}
