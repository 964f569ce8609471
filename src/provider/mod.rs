//! Generative-AI provider seam

mod openai;

use async_trait::async_trait;
use bytes::Bytes;

use crate::api::{AudioFormat, Message};

pub use openai::OpenAiClient;

/// Uploaded audio forwarded unchanged to speech-to-text
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// Text-to-speech parameters
#[derive(Debug, Clone, Copy)]
pub struct SpeechParams<'a> {
    pub model: &'a str,
    pub voice: &'a str,
    pub format: AudioFormat,
}

/// Upstream calls made by the chat, transcription and synthesis routes
///
/// The API key is passed per call; implementations hold no credentials.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Chat completion; returns the first choice's content
    async fn chat(&self, api_key: &str, model: &str, messages: &[Message]) -> Result<String, ProviderError>;

    /// Speech-to-text; returns the transcript
    async fn transcribe(&self, api_key: &str, model: &str, audio: AudioUpload) -> Result<String, ProviderError>;

    /// Text-to-speech; returns the complete encoded audio
    async fn synthesize(&self, api_key: &str, params: SpeechParams<'_>, text: &str) -> Result<Bytes, ProviderError>;

    /// Name of the provider (for logging)
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider returned no choices")]
    EmptyResponse,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}
