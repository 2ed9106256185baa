use std::cmp::Reverse;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use agriconnect_auth::User;
use agriconnect_catalog::{Category, Listing, ListingKind};
use agriconnect_community::{BlogPost, Resource};
use agriconnect_core::{CategoryId, ListingId, PostId, ResourceId, UserId};

use super::{
    BlogStore, CategoryFilter, CategoryStore, ListingStore, ResourceStore, StoreError, StoreResult,
    UserStore,
};

/// Keyed table behind a `RwLock`.
#[derive(Debug)]
struct Table<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> StoreResult<Option<V>> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn upsert(&self, key: K, value: V) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(poisoned)?;
        map.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &K) -> StoreResult<Option<V>> {
        let mut map = self.inner.write().map_err(poisoned)?;
        Ok(map.remove(key))
    }

    fn select(&self, mut keep: impl FnMut(&V) -> bool) -> StoreResult<Vec<V>> {
        let map = self.inner.read().map_err(poisoned)?;
        Ok(map.values().filter(|v| keep(v)).cloned().collect())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Storage("in-memory table lock poisoned".to_string())
}

/// In-memory persistence for tests/dev. Implements every store trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: Table<UserId, User>,
    categories: Table<CategoryId, Category>,
    listings: Table<(ListingKind, ListingId), Listing>,
    posts: Table<PostId, BlogPost>,
    resources: Table<ResourceId, Resource>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        self.users.get(id)
    }

    async fn find_active_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_lowercase();
        let found = self
            .users
            .select(|u| u.is_active && u.email.to_lowercase() == email)?;
        Ok(found.into_iter().next())
    }

    async fn list_producers(&self) -> StoreResult<Vec<User>> {
        let mut users = self.users.select(User::is_producer)?;
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(users)
    }

    async fn upsert(&self, user: User) -> StoreResult<()> {
        self.users.upsert(user.id.clone(), user)
    }

    async fn delete(&self, id: &UserId) -> StoreResult<Option<User>> {
        self.users.remove(id)
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore {
    async fn get(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        self.categories.get(&id)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Category>> {
        let name = name.to_lowercase();
        let found = self.categories.select(|c| c.name.to_lowercase() == name)?;
        Ok(found.into_iter().next())
    }

    async fn list(&self, filter: CategoryFilter) -> StoreResult<Vec<Category>> {
        let mut categories = self.categories.select(|c| filter.matches(c))?;
        categories.sort_by(|a, b| {
            (a.status.as_str(), &a.name).cmp(&(b.status.as_str(), &b.name))
        });
        Ok(categories)
    }

    async fn upsert(&self, category: Category) -> StoreResult<()> {
        self.categories.upsert(category.id, category)
    }

    async fn delete(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        self.categories.remove(&id)
    }
}

fn newest_first(listings: &mut [Listing]) {
    listings.sort_by_key(|l| Reverse((l.date_posted, l.id)));
}

#[async_trait]
impl ListingStore for InMemoryStore {
    async fn get(&self, kind: ListingKind, id: ListingId) -> StoreResult<Option<Listing>> {
        self.listings.get(&(kind, id))
    }

    async fn list_by_owner(&self, kind: ListingKind, owner: &UserId) -> StoreResult<Vec<Listing>> {
        let mut listings = self.listings.select(|l| l.kind == kind && l.user_id == *owner)?;
        newest_first(&mut listings);
        Ok(listings)
    }

    async fn list_all(&self, kind: ListingKind) -> StoreResult<Vec<Listing>> {
        let mut listings = self.listings.select(|l| l.kind == kind)?;
        newest_first(&mut listings);
        Ok(listings)
    }

    async fn upsert(&self, listing: Listing) -> StoreResult<()> {
        self.listings.upsert((listing.kind, listing.id), listing)
    }

    async fn delete(&self, kind: ListingKind, id: ListingId) -> StoreResult<Option<Listing>> {
        self.listings.remove(&(kind, id))
    }

    async fn count_in_category(&self, category: CategoryId) -> StoreResult<u64> {
        let refs = self.listings.select(|l| l.category_id == category)?;
        Ok(refs.len() as u64)
    }
}

#[async_trait]
impl BlogStore for InMemoryStore {
    async fn get(&self, id: PostId) -> StoreResult<Option<BlogPost>> {
        self.posts.get(&id)
    }

    async fn list(&self) -> StoreResult<Vec<BlogPost>> {
        let mut posts = self.posts.select(|_| true)?;
        posts.sort_by_key(|p| Reverse((p.date_posted, p.id)));
        Ok(posts)
    }

    async fn upsert(&self, post: BlogPost) -> StoreResult<()> {
        self.posts.upsert(post.id, post)
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn get(&self, id: ResourceId) -> StoreResult<Option<Resource>> {
        self.resources.get(&id)
    }

    async fn list(&self) -> StoreResult<Vec<Resource>> {
        let mut resources = self.resources.select(|_| true)?;
        resources.sort_by_key(|r| Reverse((r.upload_date, r.id)));
        Ok(resources)
    }

    async fn upsert(&self, resource: Resource) -> StoreResult<()> {
        self.resources.upsert(resource.id, resource)
    }

    async fn delete(&self, id: ResourceId) -> StoreResult<Option<Resource>> {
        self.resources.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agriconnect_auth::{ProducerRole, RegisterUser, Role};
    use agriconnect_catalog::{CategoryStatus, ListingDraft};
    use chrono::{Duration, Utc};

    fn user(id: &str, name: &str, role: ProducerRole) -> User {
        let details = RegisterUser {
            full_name: name.to_string(),
            email: format!("{id}@x.com"),
        };
        User::register(UserId::new(id), details, role, Utc::now())
    }

    fn listing(kind: ListingKind, owner: &str, category: CategoryId, age_minutes: i64) -> Listing {
        let draft = ListingDraft {
            name: format!("item-{age_minutes}"),
            description: String::new(),
            quantity: 1,
            category_id: category,
            image: None,
        };
        Listing::create(
            kind,
            UserId::new(owner),
            owner,
            draft,
            Utc::now() - Duration::minutes(age_minutes),
        )
    }

    #[tokio::test]
    async fn producers_are_listed_by_name_without_employees() {
        let store = InMemoryStore::new();
        UserStore::upsert(&store, user("b", "Zola", ProducerRole::Farmer)).await.unwrap();
        UserStore::upsert(&store, user("a", "Amos", ProducerRole::GreenTech)).await.unwrap();
        let mut employee = user("e", "Eve", ProducerRole::Farmer);
        employee.role = Role::Employee;
        UserStore::upsert(&store, employee).await.unwrap();

        let names: Vec<_> = store
            .list_producers()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.full_name)
            .collect();
        assert_eq!(names, vec!["Amos", "Zola"]);
    }

    #[tokio::test]
    async fn inactive_users_are_not_found_by_email() {
        let store = InMemoryStore::new();
        let mut u = user("a", "Amos", ProducerRole::Farmer);
        u.is_active = false;
        UserStore::upsert(&store, u).await.unwrap();
        assert!(store.find_active_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn email_and_category_lookups_ignore_case() {
        let store = InMemoryStore::new();
        UserStore::upsert(&store, user("a", "Amos", ProducerRole::Farmer)).await.unwrap();
        let found = store.find_active_by_email("A@X.com").await.unwrap();
        assert_eq!(found.map(|u| u.full_name), Some("Amos".to_string()));

        let grains = Category::request("Grains", ProducerRole::Farmer).unwrap();
        CategoryStore::upsert(&store, grains.clone()).await.unwrap();
        assert_eq!(store.find_by_name("grains").await.unwrap(), Some(grains));
        assert!(store.find_by_name("grain").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn categories_filter_and_order_by_status_then_name() {
        let store = InMemoryStore::new();
        let mut approved = Category::request("Tubers", ProducerRole::Farmer).unwrap();
        approved.transition_to(CategoryStatus::Approved).unwrap();
        let pending = Category::request("Grains", ProducerRole::Farmer).unwrap();
        let solar = Category::request("Solar", ProducerRole::GreenTech).unwrap();
        for c in [pending.clone(), approved.clone(), solar] {
            CategoryStore::upsert(&store, c).await.unwrap();
        }

        let farmer = CategoryStore::list(&store, CategoryFilter::requested_by(ProducerRole::Farmer))
            .await
            .unwrap();
        assert_eq!(farmer, vec![approved.clone(), pending]);

        let offered = CategoryStore::list(&store, CategoryFilter::offered_to(ProducerRole::Farmer))
            .await
            .unwrap();
        assert_eq!(offered, vec![approved]);
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_kept_per_kind() {
        let store = InMemoryStore::new();
        let category = CategoryId::new();
        let old = listing(ListingKind::Farm, "f1", category, 30);
        let new = listing(ListingKind::Farm, "f1", category, 1);
        let other = listing(ListingKind::GreenTech, "f1", category, 5);
        for l in [old.clone(), new.clone(), other.clone()] {
            ListingStore::upsert(&store, l).await.unwrap();
        }

        let mine = store.list_by_owner(ListingKind::Farm, &UserId::new("f1")).await.unwrap();
        assert_eq!(mine, vec![new, old.clone()]);
        assert!(ListingStore::get(&store, ListingKind::Farm, other.id).await.unwrap().is_none());
        assert_eq!(store.count_in_category(category).await.unwrap(), 3);

        let removed = ListingStore::delete(&store, ListingKind::Farm, old.id).await.unwrap();
        assert_eq!(removed.map(|l| l.id), Some(old.id));
        assert_eq!(store.count_in_category(category).await.unwrap(), 2);
    }
}
