use axum::{Extension, Json, http::StatusCode};

use crate::app::dto::SessionView;
use crate::app::errors::ApiError;
use crate::context::SessionContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(session): Extension<SessionContext>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(SessionView::from(session.require()?)))
}
