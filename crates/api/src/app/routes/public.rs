use std::sync::Arc;

use axum::{Extension, Json, Router, routing::{get, post}};

use agriconnect_community::Resource;

use crate::app::dto::{ContactRequest, MessageResponse, PublicEnquiryRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/enquiry", post(enquiry))
        .route("/contact", post(contact))
        .route("/resources", get(resources))
}

pub async fn enquiry(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<PublicEnquiryRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(MessageResponse::new(services.public_enquiry(body).await?)))
}

pub async fn contact(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<ContactRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    Ok(Json(MessageResponse::new(services.contact(body).await?)))
}

/// Educational resources, newest first. Shared by the public site and the
/// producer areas.
pub async fn resources(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(services.list_resources().await?))
}
