//! HTTP application wiring.
//!
//! - `services.rs`: use cases and collaborator wiring
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response shapes
//! - `errors.rs`: error to response mapping

use std::sync::Arc;

use axum::{
    Extension, Router, extract::DefaultBodyLimit, middleware::from_fn_with_state, routing::get,
};
use tower::ServiceBuilder;

use agriconnect_infra::AppConfig;

use crate::middleware::session_middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Largest accepted request body; bounds image and resource uploads.
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Build the full HTTP router from configuration (used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_app_with(Arc::new(services)))
}

/// Build the router around already wired services.
pub fn build_app_with(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
                .layer(Extension(services.clone()))
                .layer(from_fn_with_state(services, session_middleware)),
        )
}
