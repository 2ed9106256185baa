use std::sync::Arc;

use chrono::Utc;
use reqwest::{StatusCode, header, multipart, redirect};
use serde_json::{Value, json};

use agriconnect_api::app::build_app_with;
use agriconnect_api::app::services::{AppServices, Collaborators};
use agriconnect_auth::{ProducerRole, Role, User};
use agriconnect_catalog::{Category, CategoryStatus};
use agriconnect_core::{CategoryId, UserId};
use agriconnect_infra::{
    AppConfig, CategoryStore, InMemoryFileArea, InMemoryIdentityProvider, InMemorySessionStore,
    InMemoryStore, RecordingMailRelay, UserStore,
};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    store: Arc<InMemoryStore>,
    identity: Arc<InMemoryIdentityProvider>,
    mail: Arc<RecordingMailRelay>,
    files: Arc<InMemoryFileArea>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = InMemoryStore::arc();
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let mail = Arc::new(RecordingMailRelay::new());
        let files = Arc::new(InMemoryFileArea::new());

        let collaborators = Collaborators::from_store(
            store.clone(),
            Arc::new(InMemorySessionStore::new()),
            identity.clone(),
            mail.clone(),
            files.clone(),
        );
        let services = AppServices::new(collaborators, &AppConfig::default());
        // Same router as prod, bound to an ephemeral port.
        let app = build_app_with(Arc::new(services));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            store,
            identity,
            mail,
            files,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Create an identity account plus the matching local user.
    async fn seed_user(&self, role: Role, name: &str, email: &str, active: bool) -> UserId {
        let id = self.identity.with_account(email, "s3cret!");
        let user = User {
            id: id.clone(),
            full_name: name.to_string(),
            email: email.to_string(),
            role,
            date_registered: Utc::now(),
            is_active: active,
        };
        UserStore::upsert(self.store.as_ref(), user).await.unwrap();
        id
    }

    async fn approved_category(&self, name: &str, role: ProducerRole) -> CategoryId {
        let mut category = Category::request(name, role).unwrap();
        category.transition_to(CategoryStatus::Approved).unwrap();
        let id = category.id;
        CategoryStore::upsert(self.store.as_ref(), category).await.unwrap();
        id
    }

    /// Log in and return the `Cookie` header value for the session.
    async fn login(&self, email: &str) -> String {
        let res = self
            .client
            .post(self.url("/account/login"))
            .json(&json!({ "email": email, "password": "s3cret!" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    async fn get(&self, path: &str, cookie: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header(header::COOKIE, cookie)
            .send()
            .await
            .unwrap()
    }

    async fn add_listing(&self, cookie: &str, category: CategoryId, name: &str) -> reqwest::Response {
        let form = multipart::Form::new()
            .text("name", name.to_string())
            .text("description", "fresh")
            .text("quantity", "12")
            .text("category_id", category.to_string());
        self.client
            .post(self.url("/farmer/listings"))
            .header(header::COOKIE, cookie)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_and_public_resources_need_no_session() {
    let server = TestServer::spawn().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.client.get(server.url("/resources")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn anonymous_requests_are_redirected_to_login() {
    let server = TestServer::spawn().await;

    for path in ["/whoami", "/employee/users", "/farmer/listings", "/greentech/dashboard"] {
        let res = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), "/account/login");
    }

    // A forged cookie is treated as no session at all.
    let res = server.get("/whoami", "agri_session=not-a-session").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn producers_are_forbidden_on_employee_routes() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    let cookie = server.login("jane@farm.test").await;

    let res = server.get("/employee/users", &cookie).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Role is checked before the target is looked up.
    let res = server
        .client
        .delete(server.url("/employee/users/no-such-user"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.get("/greentech/listings", &cookie).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_password_is_rejected_without_a_session() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;

    let res = server
        .client
        .post(server.url("/account/login"))
        .json(&json!({ "email": "jane@farm.test", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid email or password.");
}

#[tokio::test]
async fn deactivated_user_cannot_sign_in() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Farmer, "Old Farmer", "old@farm.test", false).await;

    let res = server
        .client
        .post(server.url("/account/login"))
        .json(&json!({ "email": "old@farm.test", "password": "s3cret!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Your account has been deactivated. Contact the administrator."
    );
}

#[tokio::test]
async fn login_returns_dashboard_and_logout_ends_the_session() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::GreenTech, "Sol Power", "sol@green.test", true).await;

    let res = server
        .client
        .post(server.url("/account/login"))
        .json(&json!({ "email": "sol@green.test", "password": "s3cret!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Welcome back, Sol Power!");
    assert_eq!(body["redirect"], "/greentech/dashboard");

    let res = server.get("/whoami", &cookie).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["role"], "GreenTech");

    let res = server
        .client
        .post(server.url("/account/logout"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let res = server.get("/whoami", &cookie).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn employee_adds_farmer_who_then_signs_in() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Employee, "Admin", "admin@agri.test", true).await;
    let cookie = server.login("admin@agri.test").await;

    let res = server
        .client
        .post(server.url("/employee/users/farmers"))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "full_name": "Jane Doe", "email": "jane@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Farmer Jane Doe added successfully! A secure password setup email has been sent to jane@x.com."
    );
    assert_eq!(body["data"]["role"], "Farmer");
    assert_eq!(server.identity.password_resets(), vec!["jane@x.com".to_string()]);

    // Same address again is refused while the first account is active.
    let res = server
        .client
        .post(server.url("/employee/users/greentech"))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "full_name": "Jane Again", "email": "jane@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    assert!(server.identity.set_password("jane@x.com", "s3cret!"));
    let farmer = server.login("jane@x.com").await;
    let res = server.get("/farmer/dashboard", &farmer).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn failed_setup_email_leaves_no_local_user() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Employee, "Admin", "admin@agri.test", true).await;
    let cookie = server.login("admin@agri.test").await;
    server.identity.fail_password_resets(true);

    let res = server
        .client
        .post(server.url("/employee/users/farmers"))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "full_name": "Jane Doe", "email": "jane@x.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "User created, but failed to send password setup email."
    );

    // The identity account exists but no local user was written.
    assert!(server.identity.has_account("jane@x.com"));
    let users: Value = server.get("/employee/users", &cookie).await.json().await.unwrap();
    assert_eq!(users, json!([]));
}

#[tokio::test]
async fn requested_category_is_offered_once_approved() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Employee, "Admin", "admin@agri.test", true).await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    let employee = server.login("admin@agri.test").await;
    let farmer = server.login("jane@farm.test").await;

    let res = server
        .client
        .post(server.url("/farmer/categories"))
        .header(header::COOKIE, &farmer)
        .json(&json!({ "name": "Grains" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Category request submitted for approval.");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let offered: Value = server.get("/farmer/categories", &farmer).await.json().await.unwrap();
    assert_eq!(offered, json!([]));

    let pending: Value = server
        .get("/employee/categories/farmer", &employee)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(pending[0]["status"], "Pending");

    let res = server
        .client
        .post(server.url(&format!("/employee/categories/{id}/status")))
        .header(header::COOKIE, &employee)
        .json(&json!({ "status": "Approved" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let offered: Value = server.get("/farmer/categories", &farmer).await.json().await.unwrap();
    assert_eq!(offered[0]["name"], "Grains");

    // Approved is terminal.
    let res = server
        .client
        .post(server.url(&format!("/employee/categories/{id}/status")))
        .header(header::COOKIE, &employee)
        .json(&json!({ "status": "Rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = server
        .client
        .post(server.url("/farmer/categories"))
        .header(header::COOKIE, &farmer)
        .json(&json!({ "name": "Grains" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn listings_are_only_visible_to_their_owner() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    server.seed_user(Role::Farmer, "Bob Roe", "bob@farm.test", true).await;
    let category = server.approved_category("Vegetables", ProducerRole::Farmer).await;
    let jane = server.login("jane@farm.test").await;
    let bob = server.login("bob@farm.test").await;

    let res = server.add_listing(&jane, category, "Carrots").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product added successfully!");
    assert_eq!(body["data"]["user_name"], "Jane Doe");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let path = format!("/farmer/listings/{id}");

    assert_eq!(server.get(&path, &jane).await.status(), StatusCode::OK);
    assert_eq!(server.get(&path, &bob).await.status(), StatusCode::NOT_FOUND);

    let form = multipart::Form::new()
        .text("name", "Stolen")
        .text("quantity", "1")
        .text("category_id", category.to_string());
    let res = server
        .client
        .put(server.url(&path))
        .header(header::COOKIE, &bob)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .delete(server.url(&path))
        .header(header::COOKIE, &bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let mine: Value = server.get("/farmer/listings", &jane).await.json().await.unwrap();
    assert_eq!(mine[0]["name"], "Carrots");
    let theirs: Value = server.get("/farmer/listings", &bob).await.json().await.unwrap();
    assert_eq!(theirs, json!([]));

    let res = server
        .client
        .delete(server.url(&path))
        .header(header::COOKIE, &jane)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn listing_needs_a_category_approved_for_the_role() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    let green = server.approved_category("Solar", ProducerRole::GreenTech).await;
    let jane = server.login("jane@farm.test").await;

    let res = server.add_listing(&jane, green, "Panels").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Please select an approved category.");
}

#[tokio::test]
async fn flag_and_restore_are_idempotent() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Employee, "Admin", "admin@agri.test", true).await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    let employee = server.login("admin@agri.test").await;
    let farmer = server.login("jane@farm.test").await;

    let res = server
        .client
        .post(server.url("/farmer/blog"))
        .header(header::COOKIE, &farmer)
        .multipart(multipart::Form::new().text("message", "Rain tomorrow"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let res = server
            .client
            .post(server.url(&format!("/employee/blog/{id}/flag")))
            .header(header::COOKIE, &employee)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"]["is_violation"], true);
        assert_eq!(
            body["data"]["violation_note"],
            "This post was removed due to community guideline violation."
        );
    }

    for _ in 0..2 {
        let res = server
            .client
            .post(server.url(&format!("/employee/blog/{id}/restore")))
            .header(header::COOKIE, &employee)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"]["is_violation"], false);
        assert_eq!(body["data"]["violation_note"], Value::Null);
    }
}

#[tokio::test]
async fn same_name_uploads_overwrite_each_other() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    server.seed_user(Role::Farmer, "Bob Smith", "bob@farm.test", true).await;
    let jane = server.login("jane@farm.test").await;
    let bob = server.login("bob@farm.test").await;

    for (farmer, bytes) in [(&jane, b"first".to_vec()), (&bob, b"second".to_vec())] {
        let image = multipart::Part::bytes(bytes).file_name("photo.jpg");
        let form = multipart::Form::new()
            .text("message", "Harvest day")
            .part("image", image);
        let res = server
            .client
            .post(server.url("/farmer/blog"))
            .header(header::COOKIE, farmer)
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["data"]["image_path"], "/uploads/photo.jpg");
    }

    assert_eq!(server.files.len(), 1);
    assert_eq!(server.files.read("/uploads/photo.jpg"), Some(b"second".to_vec()));

    let res = server.get("/farmer/blog", &jane).await;
    let posts: Vec<Value> = res.json().await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p["image_path"] == "/uploads/photo.jpg"));
}

#[tokio::test]
async fn renaming_a_user_keeps_listing_author_name() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Employee, "Admin", "admin@agri.test", true).await;
    let jane_id = server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    let category = server.approved_category("Fruit", ProducerRole::Farmer).await;
    let employee = server.login("admin@agri.test").await;
    let jane = server.login("jane@farm.test").await;
    assert_eq!(server.add_listing(&jane, category, "Apples").await.status(), StatusCode::CREATED);

    let res = server
        .client
        .put(server.url(&format!("/employee/users/{jane_id}")))
        .header(header::COOKIE, &employee)
        .json(&json!({ "full_name": "Jane Smith", "email": "jane@farm.test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["message"],
        "User Jane Smith's details have been updated successfully."
    );

    let listings: Value = server
        .get(&format!("/employee/users/{jane_id}/listings"), &employee)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(listings[0]["user_name"], "Jane Doe");
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Employee, "Admin", "admin@agri.test", true).await;
    server.seed_user(Role::Farmer, "Jane Doe", "jane@farm.test", true).await;
    let category = server.approved_category("Dairy", ProducerRole::Farmer).await;
    let employee = server.login("admin@agri.test").await;
    let jane = server.login("jane@farm.test").await;
    assert_eq!(server.add_listing(&jane, category, "Milk").await.status(), StatusCode::CREATED);

    let res = server
        .client
        .delete(server.url(&format!("/employee/categories/{category}")))
        .header(header::COOKIE, &employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn employee_manages_resources() {
    let server = TestServer::spawn().await;
    server.seed_user(Role::Employee, "Admin", "admin@agri.test", true).await;
    let employee = server.login("admin@agri.test").await;

    let res = server
        .client
        .post(server.url("/employee/resources"))
        .header(header::COOKIE, &employee)
        .multipart(multipart::Form::new().text("title", "Soil guide"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Please select a file to upload.");

    let file = multipart::Part::bytes(b"%PDF".to_vec()).file_name("soil.pdf");
    let res = server
        .client
        .post(server.url("/employee/resources"))
        .header(header::COOKIE, &employee)
        .multipart(
            multipart::Form::new()
                .text("title", "Soil guide")
                .text("description", "Basics")
                .part("file", file),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["data"]["file_path"], "/uploads/soil.pdf");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let public: Value = server
        .client
        .get(server.url("/resources"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public[0]["title"], "Soil guide");

    let res = server
        .client
        .delete(server.url(&format!("/employee/resources/{id}")))
        .header(header::COOKIE, &employee)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(server.files.is_empty());
}

#[tokio::test]
async fn public_enquiry_is_escaped_and_relayed_to_the_inbox() {
    let server = TestServer::spawn().await;

    let res = server
        .client
        .post(server.url("/enquiry"))
        .json(&json!({
            "name": "<b>Eve</b>",
            "contact_number": "555",
            "email": "eve@x.com",
            "role_interest": "Farmer",
            "message": "Hi & hello",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let sent = server.mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, AppConfig::default().enquiry_inbox);
    assert_eq!(sent[0].subject, "New Enquiry");
    assert!(sent[0].html_body.contains("&lt;b&gt;Eve&lt;/b&gt;"));
    assert!(sent[0].html_body.contains("Hi &amp; hello"));

    server.mail.fail_deliveries(true);
    let res = server
        .client
        .post(server.url("/contact"))
        .json(&json!({ "name": "Eve", "email": "eve@x.com", "message": "Hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Failed to send your message. Please try again later.");
}
