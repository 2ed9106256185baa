use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::app::dto::{ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse};
use crate::app::errors::{ApiError, LOGIN_PATH};
use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::middleware::{clear_session_cookie, set_session_cookie};

pub fn router() -> Router {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
        .route("/forgot-password", post(forgot_password))
}

/// Signed-in users go straight to their dashboard.
pub async fn login_page(Extension(session): Extension<SessionContext>) -> Response {
    match session.state() {
        Some(state) => Redirect::to(state.role.dashboard_path()).into_response(),
        None => Json(MessageResponse::new("Please sign in.")).into_response(),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let (id, state) = services.login(&body.email, &body.password).await?;
    let cookie = set_session_cookie(services.session_cookie(), id);

    let mut res = Json(LoginResponse {
        message: format!("Welcome back, {}!", state.name),
        redirect: state.role.dashboard_path(),
        role: state.role,
        name: state.name,
    })
    .into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        res.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(res)
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, ApiError> {
    services.logout(session.id()).await?;

    let mut res = Redirect::to(LOGIN_PATH).into_response();
    if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(services.session_cookie())) {
        res.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(res)
}

pub async fn forgot_password(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let message = services.forgot_password(&body.email).await?;
    Ok(Json(MessageResponse::new(message)))
}
