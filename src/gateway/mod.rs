//! HTTP gateway

mod error;
mod handlers;
pub mod server;

pub use error::ApiError;
pub use handlers::HEALTH_MESSAGE;
pub use server::{build_http_client, router, run_server, GatewayState};
