//! voice-gateway: credential-holding HTTP gateway for a voice chat client
//!
//! Features:
//! - LiveKit access token issuance
//! - OpenAI chat, speech-to-text and text-to-speech forwarding
//! - Credentials loaded once from Google Cloud Secret Manager

pub mod api;
pub mod config;
pub mod gateway;
pub mod livekit;
pub mod provider;
pub mod secrets;

pub use config::AppConfig;
pub use gateway::{router, run_server, GatewayState};
pub use secrets::Credentials;
