//! External identity provider: password sign-in, account creation and
//! password-reset emails. Local user records are keyed by the provider's
//! account id.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use agriconnect_core::UserId;

pub mod firebase;
pub mod in_memory;

pub use firebase::FirebaseIdentityProvider;
pub use in_memory::InMemoryIdentityProvider;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailExists,

    /// The provider refused the request for another reason (its error code).
    #[error("{0}")]
    Rejected(String),

    #[error("identity provider unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and return the account id.
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, IdentityError>;

    /// Create an account and return its id.
    async fn register(&self, email: &str, password: &str) -> Result<UserId, IdentityError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;
}

/// Throwaway password for accounts created on a user's behalf: 12 hex
/// characters and a `!`. The user replaces it through the reset email.
pub fn temporary_password() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}!", &hex[..12])
}
