//! `agriconnect-auth`: pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod capability;
pub mod roles;
pub mod session;
pub mod user;

pub use authorize::{AuthzError, authorize};
pub use capability::{Capability, OwnedRecord, RecordKind};
pub use roles::{ProducerRole, Role, UnknownRole};
pub use session::SessionState;
pub use user::{RegisterUser, User, validate_email};
