use agriconnect_core::UserId;

use crate::Role;

/// Kind of record whose mutation is restricted to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    FarmProduct,
    GreenTechProduct,
}

/// A looked-up record as seen by the ownership check.
///
/// `owner` is `None` when the record does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRecord {
    pub kind: RecordKind,
    pub owner: Option<UserId>,
}

impl OwnedRecord {
    pub fn new(kind: RecordKind, owner: Option<UserId>) -> Self {
        Self { kind, owner }
    }

    pub fn missing(kind: RecordKind) -> Self {
        Self { kind, owner: None }
    }
}

/// What an action requires of the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability {
    /// Anyone, including anonymous visitors.
    Public,
    /// Any logged-in user.
    Authenticated,
    /// A logged-in user with exactly this role.
    RoleEquals(Role),
    /// A logged-in user who owns the record.
    OwnerOf(OwnedRecord),
}

impl Capability {
    pub fn requires_authentication(&self) -> bool {
        !matches!(self, Capability::Public)
    }
}
