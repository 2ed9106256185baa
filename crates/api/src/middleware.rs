use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use agriconnect_auth::{Capability, authorize};
use agriconnect_infra::SessionId;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::SessionContext;

/// Resolve the session cookie into a [`SessionContext`] extension.
///
/// Never rejects: unknown or malformed cookies make the request anonymous.
pub async fn session_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let context = match session_cookie(req.headers(), services.session_cookie()) {
        Some(id) => match services.session_state(id).await {
            Ok(Some(state)) => SessionContext::new(Some(id), Some(state)),
            Ok(None) => SessionContext::anonymous(),
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                SessionContext::anonymous()
            }
        },
        None => SessionContext::anonymous(),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Gate a route group on a capability.
///
/// Used as `route_layer(from_fn_with_state(capability, require))`.
pub async fn require(
    State(capability): State<Capability>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let session = req
        .extensions()
        .get::<SessionContext>()
        .and_then(|c| c.state().cloned());

    match authorize(session.as_ref(), &capability) {
        Ok(()) => next.run(req).await,
        Err(e) => {
            debug!(path = %req.uri().path(), error = %e, "request denied");
            ApiError::from(e).into_response()
        }
    }
}

fn session_cookie(headers: &HeaderMap, name: &str) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.trim().parse().ok())
}

pub fn set_session_cookie(name: &str, id: SessionId) -> String {
    format!("{name}={id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}
