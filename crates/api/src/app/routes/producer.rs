//! Farmer and GreenTech areas.
//!
//! Both roles get the same router; the role decides which listing kind and
//! which categories they see. Farmers additionally get the green-energy
//! marketplace.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path},
    http::{StatusCode, header},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use agriconnect_auth::{Capability, ProducerRole, Role};
use agriconnect_catalog::{Category, ListingDraft};
use agriconnect_core::ListingId;

use crate::app::dto::{
    BlogPostView, CategoryRequest, ListingView, MessageResponse, Outcome, ProductEnquiryRequest,
    SessionView, listing_views, post_views,
};
use crate::app::errors::ApiError;
use crate::app::routes::common::{MultipartForm, parse_id};
use crate::app::routes::public;
use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::middleware::require;

pub fn router(role: ProducerRole) -> Router {
    let mut router = Router::new()
        .route("/dashboard", get(dashboard))
        .route("/categories", get(categories).post(request_category))
        .route("/listings", get(my_listings).post(add_listing))
        .route(
            "/listings/:id",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
        .route("/listings/:id/image", get(listing_image))
        .route("/blog", get(blog).post(post_to_blog))
        .route("/resources", get(public::resources));

    if role == ProducerRole::Farmer {
        router = router
            .route("/marketplace", get(marketplace))
            .route("/marketplace/:id/enquiry", post(send_enquiry));
    }

    router
        .route_layer(from_fn_with_state(Capability::RoleEquals(Role::from(role)), require))
        .layer(Extension(role))
}

pub async fn dashboard(
    Extension(session): Extension<SessionContext>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(SessionView::from(session.require()?)))
}

// ---- categories ----

/// Approved categories this role may list under.
pub async fn categories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(services.offered_categories(role).await?))
}

pub async fn request_category(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Outcome<Category>>), ApiError> {
    let category = services.request_category(role, &body.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(Outcome::new("Category request submitted for approval.", category)),
    ))
}

// ---- listings ----

fn listing_draft(mut form: MultipartForm) -> Result<ListingDraft, ApiError> {
    let quantity = form
        .text("quantity")
        .trim()
        .parse::<i32>()
        .map_err(|_| ApiError::validation("Quantity must be a whole number."))?;
    let category_id = form
        .text("category_id")
        .trim()
        .parse()
        .map_err(|_| ApiError::validation("Please select an approved category."))?;
    Ok(ListingDraft {
        name: form.text("name").to_string(),
        description: form.text("description").to_string(),
        quantity,
        category_id,
        image: form.take_file("image").map(|upload| upload.bytes),
    })
}

pub async fn my_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    let owner = session.require()?;
    Ok(Json(listing_views(services.my_listings(owner, role).await?)))
}

pub async fn add_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
    Extension(session): Extension<SessionContext>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Outcome<ListingView>>), ApiError> {
    let owner = session.require()?;
    let draft = listing_draft(MultipartForm::read(multipart).await?)?;
    let listing = services.create_listing(owner, role, draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(Outcome::new("Product added successfully!", listing.into())),
    ))
}

pub async fn get_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<ListingView>, ApiError> {
    let owner = session.require()?;
    let id: ListingId = parse_id(&id)?;
    Ok(Json(services.own_listing(owner, role, id).await?.into()))
}

pub async fn update_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Outcome<ListingView>>, ApiError> {
    let owner = session.require()?;
    let id: ListingId = parse_id(&id)?;
    let draft = listing_draft(MultipartForm::read(multipart).await?)?;
    let listing = services.update_listing(owner, role, id, draft).await?;
    Ok(Json(Outcome::new("Product updated successfully.", listing.into())))
}

pub async fn delete_listing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let owner = session.require()?;
    let id: ListingId = parse_id(&id)?;
    services.delete_listing(owner, role, id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully.")))
}

pub async fn listing_image(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(role): Extension<ProducerRole>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let owner = session.require()?;
    let id: ListingId = parse_id(&id)?;
    let image = services
        .own_listing(owner, role, id)
        .await?
        .image
        .ok_or_else(ApiError::not_found)?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], image).into_response())
}

// ---- community ----

pub async fn blog(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<BlogPostView>>, ApiError> {
    Ok(Json(post_views(services.list_posts().await?)))
}

pub async fn post_to_blog(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Outcome<BlogPostView>>), ApiError> {
    let author = session.require()?;
    let mut form = MultipartForm::read(multipart).await?;
    let image = form.take_file("image");
    let post = services.post_to_blog(author, form.text("message"), image).await?;
    Ok((
        StatusCode::CREATED,
        Json(Outcome::new("Post added successfully.", post.into())),
    ))
}

// ---- marketplace (farmers) ----

pub async fn marketplace(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    Ok(Json(listing_views(services.green_tech_marketplace().await?)))
}

pub async fn send_enquiry(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ProductEnquiryRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: ListingId = parse_id(&id)?;
    Ok(Json(MessageResponse::new(services.send_product_enquiry(id, body).await?)))
}
