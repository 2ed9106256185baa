//! Persistence for users, categories, listings, blog posts and resources.
//!
//! One trait per record type. Writes are independent upserts with
//! last-writer-wins semantics; nothing here spans records in a transaction.

use async_trait::async_trait;
use thiserror::Error;

use agriconnect_auth::{ProducerRole, User};
use agriconnect_catalog::{Category, CategoryStatus, Listing, ListingKind};
use agriconnect_community::{BlogPost, Resource};
use agriconnect_core::{CategoryId, ListingId, PostId, ResourceId, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored row could not be turned back into a domain record.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: &UserId) -> StoreResult<Option<User>>;

    /// Emails compare case-insensitively.
    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Farmer and GreenTech users, ordered by full name.
    async fn list_producers(&self) -> StoreResult<Vec<User>>;

    async fn upsert(&self, user: User) -> StoreResult<()>;

    /// Remove and return the user, if present.
    async fn delete(&self, id: &UserId) -> StoreResult<Option<User>>;
}

/// Filter for category listings. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    pub requestor_role: Option<ProducerRole>,
    pub status: Option<CategoryStatus>,
}

impl CategoryFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn requested_by(role: ProducerRole) -> Self {
        Self {
            requestor_role: Some(role),
            status: None,
        }
    }

    /// Categories a producer of `role` may attach to a listing.
    pub fn offered_to(role: ProducerRole) -> Self {
        Self {
            requestor_role: Some(role),
            status: Some(CategoryStatus::Approved),
        }
    }

    pub fn matches(&self, category: &Category) -> bool {
        self.requestor_role.is_none_or(|r| r == category.requestor_role)
            && self.status.is_none_or(|s| s == category.status)
    }
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn get(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    /// Case-insensitive name lookup across every status and requestor role.
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>>;

    /// Ordered by status name, then category name.
    async fn list(&self, filter: CategoryFilter) -> StoreResult<Vec<Category>>;

    async fn upsert(&self, category: Category) -> StoreResult<()>;

    async fn delete(&self, id: CategoryId) -> StoreResult<Option<Category>>;
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get(&self, kind: ListingKind, id: ListingId) -> StoreResult<Option<Listing>>;

    /// The owner's listings of `kind`, newest first.
    async fn list_by_owner(&self, kind: ListingKind, owner: &UserId) -> StoreResult<Vec<Listing>>;

    /// Every listing of `kind`, newest first.
    async fn list_all(&self, kind: ListingKind) -> StoreResult<Vec<Listing>>;

    async fn upsert(&self, listing: Listing) -> StoreResult<()>;

    async fn delete(&self, kind: ListingKind, id: ListingId) -> StoreResult<Option<Listing>>;

    /// Listings of either kind that reference `category`.
    async fn count_in_category(&self, category: CategoryId) -> StoreResult<u64>;
}

#[async_trait]
pub trait BlogStore: Send + Sync {
    async fn get(&self, id: PostId) -> StoreResult<Option<BlogPost>>;

    /// Every post, newest first, flagged ones included.
    async fn list(&self) -> StoreResult<Vec<BlogPost>>;

    async fn upsert(&self, post: BlogPost) -> StoreResult<()>;
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, id: ResourceId) -> StoreResult<Option<Resource>>;

    /// Newest upload first.
    async fn list(&self) -> StoreResult<Vec<Resource>>;

    async fn upsert(&self, resource: Resource) -> StoreResult<()>;

    async fn delete(&self, id: ResourceId) -> StoreResult<Option<Resource>>;
}
