//! Handler error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::ErrorBody;

/// Errors surfaced to clients
///
/// Messages are fixed strings; upstream detail is logged, never returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// A credential the route needs is absent
    #[error("{0}")]
    Config(&'static str),

    /// Missing or empty required input
    #[error("{0}")]
    BadRequest(&'static str),

    /// The upstream call failed
    #[error("{0}")]
    Upstream(&'static str),

    /// The request body exceeds `server.max_body_bytes`
    #[error("{0}")]
    TooLarge(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Config(_) | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
