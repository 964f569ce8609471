//! Route handlers
//!
//! Each handler checks credentials first, then validates input, then makes
//! exactly one upstream call.

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::BytesRejection,
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::server::GatewayState;
use crate::api::{
    AudioFormat, ChatRequest, ChatResponse, Message, SynthesizeRequest, TokenRequest, TokenResponse,
    TranscribeResponse,
};
use crate::livekit::{AccessToken, VideoGrant};
use crate::provider::{AudioUpload, SpeechParams};

pub const HEALTH_MESSAGE: &str = "Backend is running!";

const AUDIO_FIELD: &str = "audio_file";
const DEFAULT_AUDIO_MIME: &str = "application/octet-stream";

const LIVEKIT_CONFIG_MISSING: ApiError = ApiError::Config("LiveKit configuration missing");
const OPENAI_CONFIG_MISSING: ApiError = ApiError::Config("OpenAI configuration missing");
const BODY_TOO_LARGE: ApiError = ApiError::TooLarge("Request body too large");

/// Unwrap a buffered body, reporting the size limit in the usual `{error}` shape
fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|e| {
        tracing::debug!(error = %e, "Rejecting request body");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            BODY_TOO_LARGE
        } else {
            ApiError::BadRequest("Invalid request body")
        }
    })
}

/// Parse a JSON body where an empty body means "all defaults"
fn parse_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejecting malformed JSON body");
        ApiError::BadRequest("Invalid JSON body")
    })
}

fn require_ai_key(state: &GatewayState) -> Result<&str, ApiError> {
    state.credentials.ai_provider_key().ok_or(OPENAI_CONFIG_MISSING)
}

/// `/` - liveness check, any method
pub async fn root() -> &'static str {
    HEALTH_MESSAGE
}

/// `POST /generate-livekit-token`
pub async fn generate_token(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (api_key, api_secret) = state.credentials.platform_pair().ok_or(LIVEKIT_CONFIG_MISSING)?;
    let request: TokenRequest = parse_json_body(&read_body(body)?)?;
    let identity = request.identity();

    let token = AccessToken::new(api_key, api_secret)
        .with_identity(identity)
        .with_name(request.name())
        .with_grants(VideoGrant::join(state.config.livekit.room.as_str()))
        .to_jwt()
        .map_err(|e| {
            tracing::error!(error = %e, identity = %identity, "Error generating LiveKit token");
            ApiError::Upstream("Could not generate LiveKit token")
        })?;

    tracing::info!("Generated token for {}", identity);

    Ok(Json(TokenResponse {
        identity: identity.to_string(),
        token,
    }))
}

/// `POST /chat`
pub async fn chat(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let api_key = require_ai_key(&state)?;
    let request: ChatRequest = parse_json_body(&read_body(body)?)?;

    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("No messages provided"));
    }

    let openai = &state.config.openai;
    let mut conversation = Vec::with_capacity(request.messages.len() + 1);
    conversation.push(Message::system(openai.system_prompt.as_str()));
    conversation.extend(request.messages);

    let reply = state
        .provider
        .chat(api_key, &openai.chat_model, &conversation)
        .await
        .map_err(|e| {
            tracing::error!(provider = state.provider.name(), error = %e, "Error calling chat completion");
            ApiError::Upstream("Failed to get response from OpenAI")
        })?;

    tracing::info!(messages = conversation.len(), "Generated chat response");

    Ok(Json(ChatResponse { reply }))
}

/// Pull the `audio_file` part out of the form, skipping any other fields
async fn read_audio_field(mut multipart: Multipart) -> Result<AudioUpload, ApiError> {
    let invalid = |e: MultipartError| {
        tracing::debug!(error = %e, detail = %e.body_text(), "Rejecting multipart body");
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            BODY_TOO_LARGE
        } else {
            ApiError::BadRequest("Invalid multipart body")
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        // A part without a filename parameter is a plain form value, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(ApiError::BadRequest("No selected file"));
        }

        let mime_type = field.content_type().unwrap_or(DEFAULT_AUDIO_MIME).to_string();
        let data = field.bytes().await.map_err(invalid)?;

        return Ok(AudioUpload {
            filename,
            mime_type,
            data,
        });
    }

    Err(ApiError::BadRequest("No audio file part"))
}

/// `POST /transcribe`
pub async fn transcribe(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let api_key = require_ai_key(&state)?;

    let multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "Request is not a multipart form");
        ApiError::BadRequest("No audio file part")
    })?;
    let audio = read_audio_field(multipart).await?;

    let text = state
        .provider
        .transcribe(api_key, &state.config.openai.transcription_model, audio)
        .await
        .map_err(|e| {
            tracing::error!(provider = state.provider.name(), error = %e, "Error calling speech-to-text");
            ApiError::Upstream("Failed to transcribe audio")
        })?;

    tracing::info!("Generated transcription");

    Ok(Json(TranscribeResponse { text }))
}

/// `POST /synthesize` - answers with the whole MP3 payload
pub async fn synthesize(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ApiError> {
    let api_key = require_ai_key(&state)?;
    let request: SynthesizeRequest = parse_json_body(&read_body(body)?)?;

    let text = match request.text.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => return Err(ApiError::BadRequest("No text provided")),
    };

    let openai = &state.config.openai;
    let params = SpeechParams {
        model: &openai.speech_model,
        voice: &openai.voice,
        format: AudioFormat::Mp3,
    };

    let audio = state
        .provider
        .synthesize(api_key, params, text)
        .await
        .map_err(|e| {
            tracing::error!(provider = state.provider.name(), error = %e, "Error calling text-to-speech");
            ApiError::Upstream("Failed to synthesize speech")
        })?;

    tracing::info!(bytes = audio.len(), "Generated speech");

    Ok(([(header::CONTENT_TYPE, params.format.mime_type())], audio).into_response())
}
