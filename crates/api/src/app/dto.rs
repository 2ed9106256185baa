use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agriconnect_auth::{Role, SessionState};
use agriconnect_catalog::{Listing, ListingKind};
use agriconnect_community::BlogPost;
use agriconnect_core::{CategoryId, ListingId, PostId, UserId};

/// A file received in a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Browsers send an empty, unnamed part when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty() || self.file_name.trim().is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PublicEnquiryRequest {
    pub name: String,
    pub contact_number: String,
    pub email: String,
    pub role_interest: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub name: String,
    pub contact_number: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductEnquiryRequest {
    pub full_name: String,
    pub contact_number: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub redirect: &'static str,
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub uid: UserId,
    pub role: Role,
    pub name: String,
    pub is_active: bool,
}

impl From<&SessionState> for SessionView {
    fn from(s: &SessionState) -> Self {
        Self {
            uid: s.uid.clone(),
            role: s.role,
            name: s.name.clone(),
            is_active: s.is_active,
        }
    }
}

/// A user-facing message together with the record it concerns.
#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    pub message: String,
    pub data: T,
}

impl<T> Outcome<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Listing as returned over HTTP; image bytes are served separately.
#[derive(Debug, Serialize)]
pub struct ListingView {
    pub id: ListingId,
    pub kind: ListingKind,
    pub user_id: UserId,
    pub user_name: String,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub has_image: bool,
    pub date_posted: DateTime<Utc>,
}

impl From<Listing> for ListingView {
    fn from(l: Listing) -> Self {
        Self {
            id: l.id,
            kind: l.kind,
            user_id: l.user_id,
            user_name: l.user_name,
            name: l.name,
            description: l.description,
            quantity: l.quantity,
            category_id: l.category_id,
            category_name: None,
            has_image: l.image.is_some(),
            date_posted: l.date_posted,
        }
    }
}

impl ListingView {
    pub fn with_category_name(mut self, name: Option<String>) -> Self {
        self.category_name = name;
        self
    }
}

pub fn listing_views(listings: Vec<Listing>) -> Vec<ListingView> {
    listings.into_iter().map(ListingView::from).collect()
}

#[derive(Debug, Serialize)]
pub struct BlogPostView {
    pub id: PostId,
    pub user_id: UserId,
    pub user_name: String,
    pub message: String,
    pub image_path: Option<String>,
    pub date_posted: DateTime<Utc>,
    pub is_violation: bool,
    pub violation_note: Option<String>,
}

impl From<BlogPost> for BlogPostView {
    fn from(p: BlogPost) -> Self {
        Self {
            is_violation: p.moderation.is_violation(),
            violation_note: p.moderation.note().map(str::to_string),
            id: p.id,
            user_id: p.user_id,
            user_name: p.user_name,
            message: p.message,
            image_path: p.image_path,
            date_posted: p.date_posted,
        }
    }
}

pub fn post_views(posts: Vec<BlogPost>) -> Vec<BlogPostView> {
    posts.into_iter().map(BlogPostView::from).collect()
}
