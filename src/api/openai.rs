//! OpenAI API type definitions (the subset the gateway forwards to)

use serde::{Deserialize, Serialize};

/// Conversation role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Response choice
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

/// Response message
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Speech-to-text response (`response_format: json`)
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Encoding requested from the speech endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }
}

/// Text-to-speech request
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest<'a> {
    pub model: &'a str,
    pub voice: &'a str,
    pub input: &'a str,
    pub response_format: AudioFormat,
}

/// Error envelope returned on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_rejects_unknown_value() {
        let result = serde_json::from_str::<Message>(r#"{"role":"wizard","content":"hi"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_is_role_and_text_only() {
        let message: Message = serde_json::from_str(r#"{"role":"user","content":"hi","name":"x"}"#).unwrap();
        assert_eq!(message, Message::user("hi"));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({"role": "user", "content": "hi"})
        );

        let parts = r#"{"role":"user","content":[{"type":"text","text":"hi"}]}"#;
        assert!(serde_json::from_str::<Message>(parts).is_err());
    }

    #[test]
    fn test_chat_request_serialization() {
        let messages = vec![Message::system("be nice"), Message::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-4.1",
            messages: &messages,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "model": "gpt-4.1",
                "messages": [
                    {"role": "system", "content": "be nice"},
                    {"role": "user", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn test_chat_response_null_content() {
        let resp: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":null},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        assert_eq!(resp.choices.len(), 1);
        assert!(resp.choices[0].message.content.is_none());
    }

    #[test]
    fn test_speech_request_serialization() {
        let request = SpeechRequest {
            model: "gpt-4o-mini-tts",
            voice: "alloy",
            input: "hello",
            response_format: AudioFormat::Mp3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"], "mp3");
        assert_eq!(json["input"], "hello");
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
    }

    #[test]
    fn test_error_response() {
        let err: ErrorResponse = serde_json::from_str(
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#,
        )
        .unwrap();
        assert_eq!(err.error.message, "Incorrect API key provided");
    }
}
