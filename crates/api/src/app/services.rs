//! Use cases behind the HTTP handlers.
//!
//! Handlers stay thin: they parse input, call one method here and map the
//! result. Every collaborator is a trait object so tests can swap in the
//! in-memory implementations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use agriconnect_auth::{ProducerRole, RegisterUser, SessionState, User};
use agriconnect_catalog::{Category, CategoryStatus, Listing, ListingDraft, ListingKind};
use agriconnect_community::{BlogPost, Resource, ResourceDraft};
use agriconnect_core::{CategoryId, DomainError, ListingId, PostId, ResourceId, UserId};
use agriconnect_infra::identity::temporary_password;
use agriconnect_infra::mail::escape_html;
use agriconnect_infra::{
    AppConfig, BlogStore, CategoryFilter, CategoryStore, FileArea, FirebaseIdentityProvider,
    IdentityError, IdentityProvider, InMemoryIdentityProvider, InMemorySessionStore, InMemoryStore,
    ListingStore, LocalFileArea, MailRelay, PostgresStore, RecordingMailRelay, ResourceStore,
    SessionId, SessionStore, SmtpMailRelay, StoreError, UserStore,
};

use crate::app::dto::{
    ContactRequest, ListingView, ProductEnquiryRequest, PublicEnquiryRequest, Upload,
};
use crate::app::errors::ApiError;
use crate::authz::authorize_owner;

pub const INVALID_LOGIN: &str = "Invalid email or password.";
pub const ACCOUNT_NOT_FOUND: &str = "Account not found.";
pub const ACCOUNT_DISABLED: &str = "Your account has been deactivated. Contact the administrator.";

/// Everything the services talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub users: Arc<dyn UserStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub listings: Arc<dyn ListingStore>,
    pub posts: Arc<dyn BlogStore>,
    pub resources: Arc<dyn ResourceStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mail: Arc<dyn MailRelay>,
    pub files: Arc<dyn FileArea>,
}

impl Collaborators {
    /// Use one object for all five record stores.
    pub fn from_store<S>(
        store: Arc<S>,
        sessions: Arc<dyn SessionStore>,
        identity: Arc<dyn IdentityProvider>,
        mail: Arc<dyn MailRelay>,
        files: Arc<dyn FileArea>,
    ) -> Self
    where
        S: UserStore + CategoryStore + ListingStore + BlogStore + ResourceStore + 'static,
    {
        Self {
            users: store.clone(),
            categories: store.clone(),
            listings: store.clone(),
            posts: store.clone(),
            resources: store,
            sessions,
            identity,
            mail,
            files,
        }
    }
}

pub struct AppServices {
    users: Arc<dyn UserStore>,
    categories: Arc<dyn CategoryStore>,
    listings: Arc<dyn ListingStore>,
    posts: Arc<dyn BlogStore>,
    resources: Arc<dyn ResourceStore>,
    sessions: Arc<dyn SessionStore>,
    identity: Arc<dyn IdentityProvider>,
    mail: Arc<dyn MailRelay>,
    files: Arc<dyn FileArea>,
    enquiry_inbox: String,
    session_cookie: String,
}

/// Wire collaborators from configuration.
///
/// Falls back to in-memory implementations for anything not configured.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    let identity: Arc<dyn IdentityProvider> = match &config.firebase_api_key {
        Some(key) => Arc::new(FirebaseIdentityProvider::new(key.clone())?),
        None => Arc::new(InMemoryIdentityProvider::new()),
    };

    let mail: Arc<dyn MailRelay> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailRelay::new(smtp)?),
        None => Arc::new(RecordingMailRelay::new()),
    };

    let files: Arc<dyn FileArea> = Arc::new(LocalFileArea::new(config.upload_dir.clone()));

    let collaborators = match (&config.database_url, config.use_persistent_stores) {
        (Some(url), true) => {
            let store = PostgresStore::connect(url).await?;
            store.ensure_schema().await?;
            info!("using postgres stores");
            Collaborators::from_store(Arc::new(store), sessions, identity, mail, files)
        }
        _ => {
            info!("using in-memory stores");
            Collaborators::from_store(InMemoryStore::arc(), sessions, identity, mail, files)
        }
    };

    Ok(AppServices::new(collaborators, config))
}

fn label(role: ProducerRole) -> &'static str {
    match role {
        ProducerRole::Farmer => "Farmer",
        ProducerRole::GreenTech => "GreenTech user",
    }
}

impl AppServices {
    pub fn new(c: Collaborators, config: &AppConfig) -> Self {
        Self {
            users: c.users,
            categories: c.categories,
            listings: c.listings,
            posts: c.posts,
            resources: c.resources,
            sessions: c.sessions,
            identity: c.identity,
            mail: c.mail,
            files: c.files,
            enquiry_inbox: config.enquiry_inbox.clone(),
            session_cookie: config.session_cookie.clone(),
        }
    }

    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    // ---- account ----

    pub async fn session_state(&self, id: SessionId) -> Result<Option<SessionState>, StoreError> {
        Ok(self
            .sessions
            .get(id)
            .await?
            .and_then(|entries| SessionState::from_entries(&entries)))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(SessionId, SessionState), ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Email and password are required."));
        }

        let uid = match self.identity.sign_in(email, password).await {
            Ok(uid) => uid,
            Err(IdentityError::Transport(reason)) => {
                warn!(%reason, "identity provider unreachable during sign-in");
                return Err(ApiError::SignIn(INVALID_LOGIN.to_string()));
            }
            Err(_) => return Err(ApiError::SignIn(INVALID_LOGIN.to_string())),
        };

        let user = self
            .users
            .get(&uid)
            .await?
            .ok_or_else(|| ApiError::SignIn(ACCOUNT_NOT_FOUND.to_string()))?;
        if !user.can_sign_in() {
            info!(user_id = %user.id, "sign-in refused for inactive user");
            return Err(ApiError::AccountDisabled(ACCOUNT_DISABLED.to_string()));
        }

        let state = SessionState::for_user(&user);
        let id = self.sessions.create(state.to_entries()).await?;
        info!(user_id = %user.id, role = %user.role, "user signed in");
        Ok((id, state))
    }

    pub async fn logout(&self, id: Option<SessionId>) -> Result<(), ApiError> {
        if let Some(id) = id {
            self.sessions.destroy(id).await?;
        }
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::validation("Email is required."));
        }
        match self.identity.send_password_reset(email).await {
            Ok(()) => Ok("Password reset link sent. Please check your email.".to_string()),
            Err(e) => {
                warn!(error = %e, "password reset failed");
                Err(ApiError::Upstream(
                    "Failed to send reset link. Please check your email address and try again."
                        .to_string(),
                ))
            }
        }
    }

    // ---- user management ----

    /// Add a Farmer or GreenTech account.
    ///
    /// The identity account is created with a throwaway password and the user
    /// sets their own through the reset email. If that email fails the local
    /// record is not written and the identity account is left behind.
    pub async fn register_producer(
        &self,
        role: ProducerRole,
        details: RegisterUser,
    ) -> Result<(User, String), ApiError> {
        let details = details.validated()?;

        if self.users.find_active_by_email(&details.email).await?.is_some() {
            return Err(DomainError::conflict("This email is already registered and active.").into());
        }

        let external_id = match self
            .identity
            .register(&details.email, &temporary_password())
            .await
        {
            Ok(id) => id,
            Err(IdentityError::EmailExists) => {
                return Err(DomainError::conflict("This email is already registered.").into());
            }
            Err(e) => {
                warn!(error = %e, "identity registration failed");
                return Err(ApiError::Upstream(format!(
                    "Identity provider registration failed: {e}"
                )));
            }
        };

        if let Err(e) = self.identity.send_password_reset(&details.email).await {
            warn!(
                external_id = %external_id,
                error = %e,
                "password setup email failed; identity account left without local user"
            );
            return Err(ApiError::Upstream(
                "User created, but failed to send password setup email.".to_string(),
            ));
        }

        let user = User::register(external_id, details, role, Utc::now());
        self.users.upsert(user.clone()).await?;
        info!(user_id = %user.id, role = %user.role, "user added");

        let message = format!(
            "{} {} added successfully! A secure password setup email has been sent to {}.",
            label(role),
            user.full_name,
            user.email
        );
        Ok((user, message))
    }

    pub async fn list_producers(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.users.list_producers().await?)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<User, ApiError> {
        self.users.get(id).await?.ok_or_else(ApiError::not_found)
    }

    pub async fn update_user(
        &self,
        id: &UserId,
        full_name: &str,
        email: &str,
    ) -> Result<(User, String), ApiError> {
        let mut user = self.get_user(id).await?;
        user.update_details(full_name, email)?;
        self.users.upsert(user.clone()).await?;
        info!(user_id = %user.id, "user details updated");
        let message = format!("User {}'s details have been updated successfully.", user.full_name);
        Ok((user, message))
    }

    pub async fn send_password_reset_for(&self, id: &UserId) -> Result<String, ApiError> {
        let user = self.get_user(id).await?;
        match self.identity.send_password_reset(&user.email).await {
            Ok(()) => Ok(format!("Password reset link sent to {}.", user.email)),
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "password reset failed");
                Err(ApiError::Upstream(format!(
                    "Failed to send password reset link to {}.",
                    user.email
                )))
            }
        }
    }

    /// Delete a local user. Deleting an unknown id succeeds.
    pub async fn delete_user(&self, id: &UserId) -> Result<String, ApiError> {
        match self.users.delete(id).await? {
            Some(user) => {
                info!(user_id = %user.id, "user deleted");
                Ok(format!("User {} deleted successfully.", user.full_name))
            }
            None => Ok("User deleted.".to_string()),
        }
    }

    pub async fn user_listings(&self, id: &UserId) -> Result<Vec<Listing>, ApiError> {
        let user = self.get_user(id).await?;
        match user.role.as_producer() {
            Some(role) => Ok(self
                .listings
                .list_by_owner(ListingKind::for_role(role), &user.id)
                .await?),
            None => Ok(Vec::new()),
        }
    }

    /// Every farm listing with its category name, ordered by category name.
    pub async fn all_farm_listings(&self) -> Result<Vec<ListingView>, ApiError> {
        let names: HashMap<CategoryId, String> = self
            .categories
            .list(CategoryFilter::all())
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        let mut views: Vec<ListingView> = self
            .listings
            .list_all(ListingKind::Farm)
            .await?
            .into_iter()
            .map(|l| {
                let name = names.get(&l.category_id).cloned();
                ListingView::from(l).with_category_name(name)
            })
            .collect();
        views.sort_by(|a, b| a.category_name.cmp(&b.category_name));
        Ok(views)
    }

    // ---- community blog ----

    pub async fn list_posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        Ok(self.posts.list().await?)
    }

    pub async fn post_to_blog(
        &self,
        author: &SessionState,
        message: &str,
        image: Option<Upload>,
    ) -> Result<BlogPost, ApiError> {
        let mut post = BlogPost::compose(author.uid.clone(), author.name.clone(), message, None, Utc::now())?;
        if let Some(upload) = image.filter(|u| !u.is_empty()) {
            post.image_path = Some(self.files.store(&upload.file_name, &upload.bytes).await?);
        }
        self.posts.upsert(post.clone()).await?;
        info!(post_id = %post.id, user_id = %post.user_id, "blog post added");
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> Result<BlogPost, ApiError> {
        self.posts.get(id).await?.ok_or_else(ApiError::not_found)
    }

    pub async fn flag_post(&self, id: PostId) -> Result<BlogPost, ApiError> {
        let mut post = self.get_post(id).await?;
        post.flag_violation();
        self.posts.upsert(post.clone()).await?;
        info!(post_id = %id, "post marked as violation");
        Ok(post)
    }

    pub async fn restore_post(&self, id: PostId) -> Result<BlogPost, ApiError> {
        let mut post = self.get_post(id).await?;
        if post.restore() {
            self.posts.upsert(post.clone()).await?;
            info!(post_id = %id, "post restored");
        }
        Ok(post)
    }

    // ---- categories ----

    pub async fn list_categories(&self, filter: CategoryFilter) -> Result<Vec<Category>, ApiError> {
        Ok(self.categories.list(filter).await?)
    }

    pub async fn transition_category(&self, id: CategoryId, status: &str) -> Result<Category, ApiError> {
        let mut category = self
            .categories
            .get(id)
            .await?
            .ok_or_else(ApiError::not_found)?;
        let status: CategoryStatus = status.parse()?;
        if category.transition_to(status)? {
            self.categories.upsert(category.clone()).await?;
            info!(category_id = %id, status = %status, "category status changed");
        }
        Ok(category)
    }

    /// Delete a category no listing refers to.
    pub async fn delete_category(&self, id: CategoryId) -> Result<Category, ApiError> {
        let category = self
            .categories
            .get(id)
            .await?
            .ok_or_else(ApiError::not_found)?;
        let in_use = self.listings.count_in_category(id).await?;
        if in_use > 0 {
            return Err(DomainError::conflict(format!(
                "Category '{}' is still used by {} listing(s).",
                category.name, in_use
            ))
            .into());
        }
        self.categories.delete(id).await?;
        info!(category_id = %id, "category deleted");
        Ok(category)
    }

    pub async fn offered_categories(&self, role: ProducerRole) -> Result<Vec<Category>, ApiError> {
        Ok(self.categories.list(CategoryFilter::offered_to(role)).await?)
    }

    /// Name uniqueness is a check-then-insert; concurrent requests can both pass.
    pub async fn request_category(&self, role: ProducerRole, name: &str) -> Result<Category, ApiError> {
        let category = Category::request(name, role)?;
        if self.categories.find_by_name(&category.name).await?.is_some() {
            return Err(DomainError::conflict("Category already exists or is pending approval.").into());
        }
        self.categories.upsert(category.clone()).await?;
        info!(category_id = %category.id, requestor_role = %role, "category requested");
        Ok(category)
    }

    // ---- producer listings ----

    async fn ensure_category_offered(&self, role: ProducerRole, id: CategoryId) -> Result<(), ApiError> {
        match self.categories.get(id).await? {
            Some(category) if category.is_offered_to(role) => Ok(()),
            _ => Err(ApiError::validation("Please select an approved category.")),
        }
    }

    pub async fn create_listing(
        &self,
        owner: &SessionState,
        role: ProducerRole,
        draft: ListingDraft,
    ) -> Result<Listing, ApiError> {
        let draft = draft.validated()?;
        self.ensure_category_offered(role, draft.category_id).await?;
        let listing = Listing::create(
            ListingKind::for_role(role),
            owner.uid.clone(),
            owner.name.clone(),
            draft,
            Utc::now(),
        );
        self.listings.upsert(listing.clone()).await?;
        info!(listing_id = %listing.id, kind = listing.kind.as_str(), user_id = %owner.uid, "listing added");
        Ok(listing)
    }

    pub async fn my_listings(&self, owner: &SessionState, role: ProducerRole) -> Result<Vec<Listing>, ApiError> {
        Ok(self
            .listings
            .list_by_owner(ListingKind::for_role(role), &owner.uid)
            .await?)
    }

    /// Load a listing the session owns. Foreign and missing listings are both 404.
    pub async fn own_listing(
        &self,
        owner: &SessionState,
        role: ProducerRole,
        id: ListingId,
    ) -> Result<Listing, ApiError> {
        let kind = ListingKind::for_role(role);
        let listing = self.listings.get(kind, id).await?;
        authorize_owner(owner, kind, listing.as_ref())?;
        listing.ok_or_else(ApiError::not_found)
    }

    pub async fn update_listing(
        &self,
        owner: &SessionState,
        role: ProducerRole,
        id: ListingId,
        draft: ListingDraft,
    ) -> Result<Listing, ApiError> {
        let mut listing = self.own_listing(owner, role, id).await?;
        let draft = draft.validated()?;
        if draft.category_id != listing.category_id {
            self.ensure_category_offered(role, draft.category_id).await?;
        }
        listing.apply_update(draft);
        self.listings.upsert(listing.clone()).await?;
        info!(listing_id = %id, kind = listing.kind.as_str(), "listing updated");
        Ok(listing)
    }

    pub async fn delete_listing(
        &self,
        owner: &SessionState,
        role: ProducerRole,
        id: ListingId,
    ) -> Result<(), ApiError> {
        let listing = self.own_listing(owner, role, id).await?;
        self.listings.delete(listing.kind, id).await?;
        info!(listing_id = %id, kind = listing.kind.as_str(), "listing deleted");
        Ok(())
    }

    pub async fn green_tech_marketplace(&self) -> Result<Vec<Listing>, ApiError> {
        Ok(self.listings.list_all(ListingKind::GreenTech).await?)
    }

    /// Email a green-tech listing's owner on behalf of a farmer.
    pub async fn send_product_enquiry(
        &self,
        listing_id: ListingId,
        form: ProductEnquiryRequest,
    ) -> Result<String, ApiError> {
        let listing = self
            .listings
            .get(ListingKind::GreenTech, listing_id)
            .await?
            .ok_or_else(ApiError::not_found)?;
        let owner = self
            .users
            .get(&listing.user_id)
            .await?
            .ok_or_else(ApiError::not_found)?;

        let body = format!(
            "<h2>New Enquiry for {}</h2>\
             <p><strong>From:</strong> {}</p>\
             <p><strong>Contact Number:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Message:</strong> {}</p>",
            escape_html(&listing.name),
            escape_html(&form.full_name),
            escape_html(&form.contact_number),
            escape_html(&form.email),
            escape_html(&form.message),
        );
        let subject = format!("Enquiry for {}", listing.name);

        match self.mail.send(&owner.email, &subject, &body).await {
            Ok(()) => Ok("Your enquiry was sent successfully.".to_string()),
            Err(e) => {
                warn!(listing_id = %listing_id, error = %e, "product enquiry not delivered");
                Err(ApiError::Upstream(
                    "Failed to send enquiry. Please try again later.".to_string(),
                ))
            }
        }
    }

    // ---- educational resources ----

    pub async fn upload_resource(
        &self,
        draft: ResourceDraft,
        file: Option<Upload>,
    ) -> Result<Resource, ApiError> {
        let file = file
            .filter(|f| !f.is_empty())
            .ok_or_else(|| ApiError::validation("Please select a file to upload."))?;
        let draft = draft.validated()?;
        let path = self.files.store(&file.file_name, &file.bytes).await?;
        let resource = Resource::publish(draft, path, Utc::now());
        self.resources.upsert(resource.clone()).await?;
        info!(resource_id = %resource.id, file = %resource.file_path, "resource uploaded");
        Ok(resource)
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>, ApiError> {
        Ok(self.resources.list().await?)
    }

    pub async fn get_resource(&self, id: ResourceId) -> Result<Resource, ApiError> {
        self.resources.get(id).await?.ok_or_else(ApiError::not_found)
    }

    pub async fn update_resource(&self, id: ResourceId, draft: ResourceDraft) -> Result<Resource, ApiError> {
        let mut resource = self.get_resource(id).await?;
        resource.update(draft.validated()?);
        self.resources.upsert(resource.clone()).await?;
        info!(resource_id = %id, "resource updated");
        Ok(resource)
    }

    /// Remove the file, then the record.
    pub async fn delete_resource(&self, id: ResourceId) -> Result<Resource, ApiError> {
        let resource = self.get_resource(id).await?;
        self.files.delete(&resource.file_path).await?;
        self.resources.delete(id).await?;
        info!(resource_id = %id, "resource deleted");
        Ok(resource)
    }

    // ---- public forms ----

    pub async fn public_enquiry(&self, form: PublicEnquiryRequest) -> Result<String, ApiError> {
        let body = format!(
            "<h2>New Enquiry</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Contact Number:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Interested In:</strong> {}</p>\
             <p><strong>Message:</strong> {}</p>",
            escape_html(&form.name),
            escape_html(&form.contact_number),
            escape_html(&form.email),
            escape_html(&form.role_interest),
            escape_html(&form.message),
        );
        match self.mail.send(&self.enquiry_inbox, "New Enquiry", &body).await {
            Ok(()) => Ok("Your enquiry has been sent successfully.".to_string()),
            Err(e) => {
                warn!(error = %e, "public enquiry not delivered");
                Err(ApiError::Upstream(
                    "Failed to send enquiry. Please try again later.".to_string(),
                ))
            }
        }
    }

    pub async fn contact(&self, form: ContactRequest) -> Result<String, ApiError> {
        let body = format!(
            "<h2>New Contact Enquiry</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Contact Number:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Message:</strong> {}</p>",
            escape_html(&form.name),
            escape_html(&form.contact_number),
            escape_html(&form.email),
            escape_html(&form.message),
        );
        match self
            .mail
            .send(&self.enquiry_inbox, "New Contact Enquiry Received", &body)
            .await
        {
            Ok(()) => Ok(
                "Your message has been sent successfully. We will get back to you shortly."
                    .to_string(),
            ),
            Err(e) => {
                warn!(error = %e, "contact message not delivered");
                Err(ApiError::Upstream(
                    "Failed to send your message. Please try again later.".to_string(),
                ))
            }
        }
    }
}
