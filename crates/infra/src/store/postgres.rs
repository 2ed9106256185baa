//! Postgres-backed stores.
//!
//! Schema lives in `migrations/0001_init.sql` and is applied by
//! [`PostgresStore::ensure_schema`]. Farm and green-tech listings share a row
//! shape but live in separate tables.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database / pool / IO | `Storage` |
//! | Column decode, unknown enum text | `Corrupt` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::instrument;

use agriconnect_auth::{ProducerRole, Role, User};
use agriconnect_catalog::{Category, CategoryStatus, Listing, ListingKind};
use agriconnect_community::{BlogPost, Moderation, Resource};
use agriconnect_core::{CategoryId, ListingId, PostId, ResourceId, UserId};

use super::{
    BlogStore, CategoryFilter, CategoryStore, ListingStore, ResourceStore, StoreError, StoreResult,
    UserStore,
};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create any missing tables. Idempotent.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Storage(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            StoreError::Corrupt(format!("{} column {}: {}", operation, index, source))
        }
        sqlx::Error::ColumnNotFound(column) => {
            StoreError::Corrupt(format!("{} missing column {}", operation, column))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Storage(format!("{} failed: {}", operation, other)),
    }
}

fn col<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| map_sqlx_error("decode", e))
}

fn parse<T: std::str::FromStr>(column: &str, raw: String) -> StoreResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| StoreError::Corrupt(format!("{column}: {e}")))
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::new(col::<String>(row, "id")?),
        full_name: col(row, "full_name")?,
        email: col(row, "email")?,
        role: parse::<Role>("role", col(row, "role")?)?,
        date_registered: col(row, "date_registered")?,
        is_active: col(row, "is_active")?,
    })
}

fn category_from_row(row: &PgRow) -> StoreResult<Category> {
    Ok(Category {
        id: CategoryId::from_uuid(col(row, "id")?),
        name: col(row, "name")?,
        status: parse::<CategoryStatus>("status", col(row, "status")?)?,
        requestor_role: parse::<ProducerRole>("requestor_role", col(row, "requestor_role")?)?,
    })
}

fn listing_from_row(kind: ListingKind, row: &PgRow) -> StoreResult<Listing> {
    Ok(Listing {
        id: ListingId::from_uuid(col(row, "id")?),
        kind,
        user_id: UserId::new(col::<String>(row, "user_id")?),
        user_name: col(row, "user_name")?,
        name: col(row, "name")?,
        description: col(row, "description")?,
        quantity: col(row, "quantity")?,
        category_id: CategoryId::from_uuid(col(row, "category_id")?),
        image: col(row, "image")?,
        date_posted: col(row, "date_posted")?,
    })
}

fn post_from_row(row: &PgRow) -> StoreResult<BlogPost> {
    Ok(BlogPost {
        id: PostId::from_uuid(col(row, "id")?),
        user_id: UserId::new(col::<String>(row, "user_id")?),
        user_name: col(row, "user_name")?,
        message: col(row, "message")?,
        image_path: col(row, "image_path")?,
        date_posted: col(row, "date_posted")?,
        moderation: Moderation::from_parts(col(row, "is_violation")?, col(row, "violation_note")?),
    })
}

fn resource_from_row(row: &PgRow) -> StoreResult<Resource> {
    Ok(Resource {
        id: ResourceId::from_uuid(col(row, "id")?),
        title: col(row, "title")?,
        description: col(row, "description")?,
        file_path: col(row, "file_path")?,
        upload_date: col::<DateTime<Utc>>(row, "upload_date")?,
    })
}

fn listing_table(kind: ListingKind) -> &'static str {
    match kind {
        ListingKind::Farm => "farm_products",
        ListingKind::GreenTech => "green_tech_products",
    }
}

const LISTING_COLUMNS: &str =
    "id, user_id, user_name, name, description, quantity, category_id, image, date_posted";

#[async_trait]
impl UserStore for PostgresStore {
    async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE lower(email) = lower($1) AND is_active LIMIT 1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_active_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list_producers(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT * FROM users WHERE role IN ('Farmer', 'GreenTech') ORDER BY full_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_producers", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn upsert(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, role, date_registered, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.date_registered)
        .bind(user.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_user", e))?;
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl CategoryStore for PostgresStore {
    async fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE lower(name) = lower($1) LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_category_by_name", e))?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list(&self, filter: CategoryFilter) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM categories
            WHERE ($1::TEXT IS NULL OR requestor_role = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY status, name
            "#,
        )
        .bind(filter.requestor_role.map(|r| r.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self, category), fields(category_id = %category.id), err)]
    async fn upsert(&self, category: Category) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, status, requestor_role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                status = EXCLUDED.status
            "#,
        )
        .bind(*category.id.as_uuid())
        .bind(&category.name)
        .bind(category.status.as_str())
        .bind(category.requestor_role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_category", e))?;
        Ok(())
    }

    async fn delete(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("DELETE FROM categories WHERE id = $1 RETURNING *")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;
        row.as_ref().map(category_from_row).transpose()
    }
}

#[async_trait]
impl ListingStore for PostgresStore {
    async fn get(&self, kind: ListingKind, id: ListingId) -> StoreResult<Option<Listing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM {} WHERE id = $1", listing_table(kind));
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_listing", e))?;
        row.map(|r| listing_from_row(kind, &r)).transpose()
    }

    async fn list_by_owner(&self, kind: ListingKind, owner: &UserId) -> StoreResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM {} WHERE user_id = $1 ORDER BY date_posted DESC, id DESC",
            listing_table(kind)
        );
        let rows = sqlx::query(&sql)
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_listings_by_owner", e))?;
        rows.iter().map(|r| listing_from_row(kind, r)).collect()
    }

    async fn list_all(&self, kind: ListingKind) -> StoreResult<Vec<Listing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM {} ORDER BY date_posted DESC, id DESC",
            listing_table(kind)
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_listings", e))?;
        rows.iter().map(|r| listing_from_row(kind, r)).collect()
    }

    #[instrument(skip(self, listing), fields(listing_id = %listing.id, kind = listing.kind.as_str()), err)]
    async fn upsert(&self, listing: Listing) -> StoreResult<()> {
        let sql = format!(
            r#"
            INSERT INTO {} ({LISTING_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                quantity = EXCLUDED.quantity,
                category_id = EXCLUDED.category_id,
                image = EXCLUDED.image
            "#,
            listing_table(listing.kind)
        );
        sqlx::query(&sql)
            .bind(*listing.id.as_uuid())
            .bind(listing.user_id.as_str())
            .bind(&listing.user_name)
            .bind(&listing.name)
            .bind(&listing.description)
            .bind(listing.quantity)
            .bind(*listing.category_id.as_uuid())
            .bind(listing.image.as_deref())
            .bind(listing.date_posted)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("upsert_listing", e))?;
        Ok(())
    }

    async fn delete(&self, kind: ListingKind, id: ListingId) -> StoreResult<Option<Listing>> {
        let sql = format!(
            "DELETE FROM {} WHERE id = $1 RETURNING {LISTING_COLUMNS}",
            listing_table(kind)
        );
        let row = sqlx::query(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_listing", e))?;
        row.map(|r| listing_from_row(kind, &r)).transpose()
    }

    async fn count_in_category(&self, category: CategoryId) -> StoreResult<u64> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM farm_products WHERE category_id = $1)
              + (SELECT COUNT(*) FROM green_tech_products WHERE category_id = $1) AS n
            "#,
        )
        .bind(*category.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_in_category", e))?;
        let n: i64 = col(&row, "n")?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl BlogStore for PostgresStore {
    async fn get(&self, id: PostId) -> StoreResult<Option<BlogPost>> {
        let row = sqlx::query("SELECT * FROM blog_posts WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_post", e))?;
        row.as_ref().map(post_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<BlogPost>> {
        let rows = sqlx::query("SELECT * FROM blog_posts ORDER BY date_posted DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_posts", e))?;
        rows.iter().map(post_from_row).collect()
    }

    #[instrument(skip(self, post), fields(post_id = %post.id), err)]
    async fn upsert(&self, post: BlogPost) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_posts
                (id, user_id, user_name, message, image_path, date_posted, is_violation, violation_note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                message = EXCLUDED.message,
                image_path = EXCLUDED.image_path,
                is_violation = EXCLUDED.is_violation,
                violation_note = EXCLUDED.violation_note
            "#,
        )
        .bind(*post.id.as_uuid())
        .bind(post.user_id.as_str())
        .bind(&post.user_name)
        .bind(&post.message)
        .bind(post.image_path.as_deref())
        .bind(post.date_posted)
        .bind(post.moderation.is_violation())
        .bind(post.moderation.note())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_post", e))?;
        Ok(())
    }
}

#[async_trait]
impl ResourceStore for PostgresStore {
    async fn get(&self, id: ResourceId) -> StoreResult<Option<Resource>> {
        let row = sqlx::query("SELECT * FROM resources WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_resource", e))?;
        row.as_ref().map(resource_from_row).transpose()
    }

    async fn list(&self) -> StoreResult<Vec<Resource>> {
        let rows = sqlx::query("SELECT * FROM resources ORDER BY upload_date DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_resources", e))?;
        rows.iter().map(resource_from_row).collect()
    }

    #[instrument(skip(self, resource), fields(resource_id = %resource.id), err)]
    async fn upsert(&self, resource: Resource) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO resources (id, title, description, file_path, upload_date)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description
            "#,
        )
        .bind(*resource.id.as_uuid())
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.file_path)
        .bind(resource.upload_date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_resource", e))?;
        Ok(())
    }

    async fn delete(&self, id: ResourceId) -> StoreResult<Option<Resource>> {
        let row = sqlx::query("DELETE FROM resources WHERE id = $1 RETURNING *")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_resource", e))?;
        row.as_ref().map(resource_from_row).transpose()
    }
}
