use thiserror::Error;

use crate::{Capability, Role, SessionState};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// No session; the caller is sent to the login page.
    #[error("authentication required")]
    Unauthenticated,

    #[error("unauthorized: requires role '{required}'")]
    Unauthorized { required: Role },

    /// Missing record or a record owned by someone else.
    ///
    /// Both cases produce the same error so record existence is not revealed.
    #[error("not found")]
    NotFound,
}

/// Decide whether `session` may perform an action requiring `required`.
///
/// Rules apply in a fixed order: authentication, then role, then ownership.
///
/// - No IO
/// - No panics
pub fn authorize(session: Option<&SessionState>, required: &Capability) -> Result<(), AuthzError> {
    let session = match (session, required.requires_authentication()) {
        (_, false) => return Ok(()),
        (None, true) => return Err(AuthzError::Unauthenticated),
        (Some(s), true) => s,
    };

    match required {
        Capability::Public | Capability::Authenticated => Ok(()),
        Capability::RoleEquals(role) => {
            if session.role == *role {
                Ok(())
            } else {
                Err(AuthzError::Unauthorized { required: *role })
            }
        }
        Capability::OwnerOf(record) => match &record.owner {
            Some(owner) if *owner == session.uid => Ok(()),
            _ => Err(AuthzError::NotFound),
        },
    }
}
