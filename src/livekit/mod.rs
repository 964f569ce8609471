//! LiveKit access tokens
//!
//! A token is an HS256 JWT signed with the API secret. `iss` carries the API
//! key, `sub` the participant identity and `video` the room permissions.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Lifetime LiveKit applies when the issuer does not pick one
pub fn default_token_ttl() -> Duration {
    Duration::hours(6)
}

/// Room permissions carried in the `video` claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub room_join: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl VideoGrant {
    /// Join permission for a single room
    pub fn join(room: impl Into<String>) -> Self {
        Self {
            room_join: true,
            room: Some(room.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub video: VideoGrant,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Access token requires an identity")]
    MissingIdentity,

    #[error("Failed to sign access token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Builder for a signed participant token
pub struct AccessToken {
    api_key: String,
    api_secret: String,
    identity: String,
    name: Option<String>,
    ttl: Duration,
    video: VideoGrant,
}

impl AccessToken {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            identity: String::new(),
            name: None,
            ttl: default_token_ttl(),
            video: VideoGrant::default(),
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_grants(mut self, video: VideoGrant) -> Self {
        self.video = video;
        self
    }

    /// Claims as they will be signed, issued at `now`
    fn claims_at(&self, now: chrono::DateTime<Utc>) -> Claims {
        Claims {
            iss: self.api_key.clone(),
            sub: self.identity.clone(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: self.identity.clone(),
            name: self.name.clone(),
            video: self.video.clone(),
        }
    }

    /// Serialize and sign
    pub fn to_jwt(&self) -> Result<String, TokenError> {
        if self.identity.is_empty() {
            return Err(TokenError::MissingIdentity);
        }

        let claims = self.claims_at(Utc::now());
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.api_secret.as_bytes()),
        )?;
        Ok(token)
    }
}
