//! OpenAI HTTP client

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};

use super::{AiProvider, AudioUpload, ProviderError, SpeechParams};
use crate::api::{ChatCompletionRequest, ChatCompletionResponse, ErrorResponse, Message, SpeechRequest, TranscriptionResponse};

/// [`AiProvider`] that talks to the OpenAI REST API
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-2xx response into `ProviderError::Api`
    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl AiProvider for OpenAiClient {
    async fn chat(&self, api_key: &str, model: &str, messages: &[Message]) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest { model, messages };

        tracing::debug!(model = %model, messages = messages.len(), "Sending chat completion request");

        let resp = self
            .http_client
            .post(self.url("/chat/completions"))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let completion: ChatCompletionResponse = resp.json().await?;

        if let Some(ref usage) = completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        let choice = completion.choices.into_iter().next().ok_or(ProviderError::EmptyResponse)?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn transcribe(&self, api_key: &str, model: &str, audio: AudioUpload) -> Result<String, ProviderError> {
        tracing::debug!(
            model = %model,
            filename = %audio.filename,
            mime_type = %audio.mime_type,
            size = audio.data.len(),
            "Sending transcription request"
        );

        let file = Part::bytes(audio.data.to_vec())
            .file_name(audio.filename)
            .mime_str(&audio.mime_type)
            .map_err(|e| ProviderError::InvalidUpload(e.to_string()))?;
        let form = Form::new().text("model", model.to_string()).part("file", file);

        let resp = self
            .http_client
            .post(self.url("/audio/transcriptions"))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;
        let transcription: TranscriptionResponse = resp.json().await?;

        Ok(transcription.text)
    }

    async fn synthesize(&self, api_key: &str, params: SpeechParams<'_>, text: &str) -> Result<Bytes, ProviderError> {
        let request = SpeechRequest {
            model: params.model,
            voice: params.voice,
            input: text,
            response_format: params.format,
        };

        tracing::debug!(model = %params.model, voice = %params.voice, chars = text.len(), "Sending speech request");

        let resp = self
            .http_client
            .post(self.url("/audio/speech"))
            .bearer_auth(api_key)
            .header(header::ACCEPT, params.format.mime_type())
            .json(&request)
            .send()
            .await?;
        let resp = Self::check_status(resp).await?;

        Ok(resp.bytes().await?)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
