//! Gateway server: shared state, router and listener

use axum::{
    extract::DefaultBodyLimit,
    routing::{any, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::config::AppConfig;
use crate::provider::AiProvider;
use crate::secrets::Credentials;

/// Shared, read-only state for every handler
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<AppConfig>,
    pub credentials: Arc<Credentials>,
    pub provider: Arc<dyn AiProvider>,
}

impl GatewayState {
    pub fn new(config: AppConfig, credentials: Credentials, provider: Arc<dyn AiProvider>) -> Self {
        Self {
            config: Arc::new(config),
            credentials: Arc::new(credentials),
            provider,
        }
    }
}

/// Build an HTTP client for upstream calls
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().pool_max_idle_per_host(10).build()
}

/// Build the router with all five routes
pub fn router(state: GatewayState) -> Router {
    let max_body_bytes = state.config.server.max_body_bytes;

    Router::new()
        .route("/", any(handlers::root))
        .route("/generate-livekit-token", post(handlers::generate_token))
        .route("/chat", post(handlers::chat))
        .route("/transcribe", post(handlers::transcribe))
        .route("/synthesize", post(handlers::synthesize))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the gateway server
pub async fn run_server(state: GatewayState) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;

    if !state.credentials.is_complete() {
        tracing::warn!(credentials = ?state.credentials, "Starting with missing credentials");
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("voice-gateway listening on {}", addr);

    Ok(axum::serve(listener, app).await?)
}
