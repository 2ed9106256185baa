//! Local user records linked to identity-provider accounts.
//!
//! A user's id is the identity provider's account id. The role never changes
//! after creation, and `is_active = false` blocks login permanently. No action
//! flips `is_active`; the flag and the login guard exist for administrative
//! deactivation.

use chrono::{DateTime, Utc};
use lazy_regex::{Lazy, Regex, lazy_regex};
use serde::{Deserialize, Serialize};

use agriconnect_core::{DomainError, DomainResult, UserId};

use crate::{ProducerRole, Role};

static EMAIL_REGEX: Lazy<Regex> =
    lazy_regex!(r"^[A-Za-z0-9]{1}[A-Za-z0-9._%+-]*@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$");

/// Check that `email` is present and well-formed.
pub fn validate_email(email: &str) -> DomainResult<()> {
    if email.trim().is_empty() {
        return Err(DomainError::validation("Email is required."));
    }
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err(DomainError::validation("Email is not a valid email address."));
    }
    Ok(())
}

fn validate_full_name(full_name: &str) -> DomainResult<()> {
    if full_name.trim().is_empty() {
        return Err(DomainError::validation("Full name is required."));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub date_registered: DateTime<Utc>,
    pub is_active: bool,
}

/// Details submitted when an employee adds a Farmer or GreenTech user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterUser {
    pub full_name: String,
    pub email: String,
}

impl RegisterUser {
    /// Validate and normalize (trim) the submitted details.
    pub fn validated(self) -> DomainResult<Self> {
        validate_full_name(&self.full_name)?;
        validate_email(&self.email)?;
        Ok(Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
        })
    }
}

impl User {
    /// Local record for a freshly registered producer account.
    pub fn register(id: UserId, details: RegisterUser, role: ProducerRole, now: DateTime<Utc>) -> Self {
        Self {
            id,
            full_name: details.full_name,
            email: details.email,
            role: role.into(),
            date_registered: now,
            is_active: true,
        }
    }

    /// Login guard: inactive users are always rejected.
    pub fn can_sign_in(&self) -> bool {
        self.is_active
    }

    /// Employee edit of name and email. Role and activation are untouched.
    pub fn update_details(&mut self, full_name: &str, email: &str) -> DomainResult<()> {
        validate_full_name(full_name)?;
        validate_email(email)?;
        self.full_name = full_name.trim().to_string();
        self.email = email.trim().to_string();
        Ok(())
    }

    pub fn is_producer(&self) -> bool {
        self.role.as_producer().is_some()
    }
}
