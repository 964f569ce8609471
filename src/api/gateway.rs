//! Request and response bodies of the gateway's own routes

use serde::{Deserialize, Serialize};

use super::openai::Message;

pub const DEFAULT_IDENTITY: &str = "default-user";
pub const DEFAULT_NAME: &str = "Default User";

/// `POST /generate-livekit-token` body; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TokenRequest {
    pub fn identity(&self) -> &str {
        self.identity.as_deref().unwrap_or(DEFAULT_IDENTITY)
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub identity: String,
    pub token: String,
}

/// `POST /chat` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// `POST /transcribe` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// `POST /synthesize` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Body of every non-2xx gateway response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
