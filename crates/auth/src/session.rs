//! Session state established at login.
//!
//! Session stores hold plain string maps; this module owns the key names and
//! the conversion to and from the typed state.

use std::collections::HashMap;

use agriconnect_core::UserId;

use crate::{Role, User};

pub const UID: &str = "UID";
pub const ROLE: &str = "Role";
pub const NAME: &str = "Name";
pub const IS_ACTIVE: &str = "IsActive";

/// Typed view of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub uid: UserId,
    pub role: Role,
    pub name: String,
    pub is_active: bool,
}

impl SessionState {
    pub fn for_user(user: &User) -> Self {
        Self {
            uid: user.id.clone(),
            role: user.role,
            name: user.full_name.clone(),
            is_active: user.is_active,
        }
    }

    pub fn to_entries(&self) -> HashMap<String, String> {
        HashMap::from([
            (UID.to_string(), self.uid.to_string()),
            (ROLE.to_string(), self.role.to_string()),
            (NAME.to_string(), self.name.clone()),
            (IS_ACTIVE.to_string(), self.is_active.to_string()),
        ])
    }

    /// Rebuild the typed state from stored entries.
    ///
    /// Returns `None` when there is no `UID` or the role is not recognized;
    /// such a session is treated as anonymous.
    pub fn from_entries(entries: &HashMap<String, String>) -> Option<Self> {
        let uid = entries.get(UID).filter(|v| !v.is_empty())?;
        let role = match entries.get(ROLE)?.parse::<Role>() {
            Ok(role) => role,
            Err(e) => {
                tracing::debug!("ignoring session with {e}");
                return None;
            }
        };

        Some(Self {
            uid: UserId::new(uid.clone()),
            role,
            name: entries.get(NAME).cloned().unwrap_or_default(),
            is_active: entries.get(IS_ACTIVE).map(|v| v == "true").unwrap_or(false),
        })
    }
}
