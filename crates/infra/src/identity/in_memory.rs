use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use agriconnect_core::UserId;

use super::{IdentityError, IdentityProvider};

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    password: String,
}

/// Identity provider kept in process memory for tests/dev.
///
/// Reset emails are recorded instead of sent; [`Self::fail_password_resets`]
/// makes them fail.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    resets: RwLock<Vec<String>>,
    fail_resets: AtomicBool,
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> IdentityError {
    IdentityError::Transport("identity table lock poisoned".to_string())
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account and return its id.
    pub fn with_account(&self, email: &str, password: &str) -> UserId {
        let id = UserId::new(format!("local-{}", Uuid::new_v4().simple()));
        if let Ok(mut accounts) = self.accounts.write() {
            accounts.insert(
                email.to_string(),
                Account {
                    id: id.clone(),
                    password: password.to_string(),
                },
            );
        }
        id
    }

    /// What the user does after following a reset link.
    pub fn set_password(&self, email: &str, password: &str) -> bool {
        match self.accounts.write() {
            Ok(mut accounts) => match accounts.get_mut(email) {
                Some(account) => {
                    account.password = password.to_string();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    pub fn fail_password_resets(&self, fail: bool) {
        self.fail_resets.store(fail, Ordering::SeqCst);
    }

    /// Addresses a reset email was sent to, oldest first.
    pub fn password_resets(&self) -> Vec<String> {
        self.resets.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts
            .read()
            .map(|a| a.contains_key(email))
            .unwrap_or(false)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        match accounts.get(email) {
            Some(account) if account.password == password => Ok(account.id.clone()),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }

    async fn register(&self, email: &str, password: &str) -> Result<UserId, IdentityError> {
        if self.accounts.read().map_err(poisoned)?.contains_key(email) {
            return Err(IdentityError::EmailExists);
        }
        Ok(self.with_account(email, password))
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        if self.fail_resets.load(Ordering::SeqCst) {
            return Err(IdentityError::Rejected("RESET_UNAVAILABLE".to_string()));
        }
        if !self.accounts.read().map_err(poisoned)?.contains_key(email) {
            return Err(IdentityError::Rejected("EMAIL_NOT_FOUND".to_string()));
        }
        self.resets.write().map_err(poisoned)?.push(email.to_string());
        Ok(())
    }
}
