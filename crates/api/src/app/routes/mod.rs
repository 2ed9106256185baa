use axum::{Router, middleware::from_fn_with_state, routing::get};

use agriconnect_auth::{Capability, ProducerRole};

use crate::middleware::require;

pub mod account;
pub mod common;
pub mod employee;
pub mod producer;
pub mod public;
pub mod system;

/// Every route except `/health`. Each area carries its own gate.
pub fn router() -> Router {
    Router::new()
        .route(
            "/whoami",
            get(system::whoami).route_layer(from_fn_with_state(Capability::Authenticated, require)),
        )
        .merge(public::router())
        .nest("/account", account::router())
        .nest("/employee", employee::router())
        .nest("/farmer", producer::router(ProducerRole::Farmer))
        .nest("/greentech", producer::router(ProducerRole::GreenTech))
}
