use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;
use thiserror::Error;

use agriconnect_auth::AuthzError;
use agriconnect_core::DomainError;
use agriconnect_infra::{FileAreaError, StoreError};

pub const LOGIN_PATH: &str = "/account/login";

/// Every failure a handler can return, mapped once to a response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Sign-in refused: bad credentials or no local account.
    #[error("{0}")]
    SignIn(String),

    #[error("{0}")]
    AccountDisabled(String),

    /// An external service (identity provider, mail relay) failed.
    #[error("{0}")]
    Upstream(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Files(#[from] FileAreaError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Domain(DomainError::validation(msg))
    }

    pub fn not_found() -> Self {
        Self::Domain(DomainError::not_found())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Authz(AuthzError::Unauthenticated) => Redirect::to(LOGIN_PATH).into_response(),
            ApiError::Authz(e @ AuthzError::Unauthorized { .. }) => {
                json_error(StatusCode::FORBIDDEN, "unauthorized", e.to_string())
            }
            ApiError::Authz(AuthzError::NotFound) => {
                json_error(StatusCode::NOT_FOUND, "not_found", "not found")
            }
            ApiError::Domain(e) => domain_error_to_response(e),
            ApiError::SignIn(msg) => json_error(StatusCode::UNAUTHORIZED, "sign_in_failed", msg),
            ApiError::AccountDisabled(msg) => {
                json_error(StatusCode::FORBIDDEN, "account_disabled", msg)
            }
            ApiError::Upstream(msg) => json_error(StatusCode::BAD_GATEWAY, "upstream_error", msg),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
            }
            ApiError::Files(FileAreaError::InvalidName(name)) => json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("Invalid file name '{name}'."),
            ),
            ApiError::Files(e @ FileAreaError::Io(_)) => {
                tracing::error!(error = %e, "upload storage failure");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "file_error", e.to_string())
            }
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
