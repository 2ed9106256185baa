//! Employee back office: user administration, moderation, taxonomy and
//! educational resources. Every route requires the Employee role.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Multipart, Path},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use agriconnect_auth::{Capability, ProducerRole, RegisterUser, Role, User};
use agriconnect_catalog::Category;
use agriconnect_community::{Resource, ResourceDraft};
use agriconnect_core::{CategoryId, PostId, ResourceId, UserId};
use agriconnect_infra::CategoryFilter;

use crate::app::dto::{
    BlogPostView, CategoryStatusRequest, ListingView, MessageResponse, Outcome, SessionView,
    UpdateUserRequest, listing_views, post_views,
};
use crate::app::errors::ApiError;
use crate::app::routes::common::{MultipartForm, parse_id};
use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::middleware::require;

pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users", get(list_users))
        .route("/users/farmers", post(add_farmer))
        .route("/users/greentech", post(add_green_tech))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:id/password-reset", post(reset_password))
        .route("/users/:id/listings", get(user_listings))
        .route("/listings/farm", get(farm_listings))
        .route("/blog", get(blog).post(post_to_blog))
        .route("/blog/:id/flag", post(flag_post))
        .route("/blog/:id/restore", post(restore_post))
        .route("/categories", get(categories))
        .route("/categories/farmer", get(farmer_categories))
        .route("/categories/greentech", get(green_tech_categories))
        .route("/categories/:id", axum::routing::delete(delete_category))
        .route("/categories/:id/status", post(update_category_status))
        .route("/resources", get(resources).post(upload_resource))
        .route(
            "/resources/:id",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route_layer(from_fn_with_state(Capability::RoleEquals(Role::Employee), require))
}

pub async fn dashboard(
    Extension(session): Extension<SessionContext>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(SessionView::from(session.require()?)))
}

// ---- users ----

async fn register(
    services: &AppServices,
    role: ProducerRole,
    body: RegisterUser,
) -> Result<(StatusCode, Json<Outcome<User>>), ApiError> {
    let (user, message) = services.register_producer(role, body).await?;
    Ok((StatusCode::CREATED, Json(Outcome::new(message, user))))
}

pub async fn add_farmer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterUser>,
) -> Result<(StatusCode, Json<Outcome<User>>), ApiError> {
    register(&services, ProducerRole::Farmer, body).await
}

pub async fn add_green_tech(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterUser>,
) -> Result<(StatusCode, Json<Outcome<User>>), ApiError> {
    register(&services, ProducerRole::GreenTech, body).await
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(services.list_producers().await?))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(services.get_user(&id).await?))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<Outcome<User>>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let (user, message) = services.update_user(&id, &body.full_name, &body.email).await?;
    Ok(Json(Outcome::new(message, user)))
}

pub async fn reset_password(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(MessageResponse::new(services.send_password_reset_for(&id).await?)))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(MessageResponse::new(services.delete_user(&id).await?)))
}

pub async fn user_listings(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(listing_views(services.user_listings(&id).await?)))
}

pub async fn farm_listings(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<ListingView>>, ApiError> {
    Ok(Json(services.all_farm_listings().await?))
}

// ---- blog moderation ----

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

pub async fn flag_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Outcome<BlogPostView>>, ApiError> {
    let id: PostId = parse_id(&id)?;
    let post = services.flag_post(id).await?;
    Ok(Json(Outcome::new("Post marked as violation successfully.", post.into())))
}

pub async fn restore_post(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Outcome<BlogPostView>>, ApiError> {
    let id: PostId = parse_id(&id)?;
    let post = services.restore_post(id).await?;
    Ok(Json(Outcome::new("Post was restored successfully.", post.into())))
}

// ---- categories ----

pub async fn categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(services.list_categories(CategoryFilter::all()).await?))
}

pub async fn farmer_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let filter = CategoryFilter::requested_by(ProducerRole::Farmer);
    Ok(Json(services.list_categories(filter).await?))
}

pub async fn green_tech_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let filter = CategoryFilter::requested_by(ProducerRole::GreenTech);
    Ok(Json(services.list_categories(filter).await?))
}

pub async fn update_category_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<CategoryStatusRequest>,
) -> Result<Json<Outcome<Category>>, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    let category = services.transition_category(id, &body.status).await?;
    Ok(Json(Outcome::new("Status updated successfully.", category)))
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: CategoryId = parse_id(&id)?;
    let category = services.delete_category(id).await?;
    Ok(Json(MessageResponse::new(format!("Category '{}' deleted.", category.name))))
}

// ---- resources ----

pub async fn upload_resource(
    Extension(services): Extension<Arc<AppServices>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Outcome<Resource>>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let file = form.take_file("file");
    let draft = ResourceDraft {
        title: form.text("title").to_string(),
        description: form.text("description").to_string(),
    };
    let resource = services.upload_resource(draft, file).await?;
    Ok((
        StatusCode::CREATED,
        Json(Outcome::new("Resource uploaded successfully!", resource)),
    ))
}

pub async fn resources(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(services.list_resources().await?))
}

pub async fn get_resource(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    let id: ResourceId = parse_id(&id)?;
    Ok(Json(services.get_resource(id).await?))
}

pub async fn update_resource(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<ResourceDraft>,
) -> Result<Json<Outcome<Resource>>, ApiError> {
    let id: ResourceId = parse_id(&id)?;
    let resource = services.update_resource(id, body).await?;
    let message = format!("Resource '{}' updated successfully.", resource.title);
    Ok(Json(Outcome::new(message, resource)))
}

pub async fn delete_resource(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id: ResourceId = parse_id(&id)?;
    services.delete_resource(id).await?;
    Ok(Json(MessageResponse::new("Resource deleted successfully.")))
}
