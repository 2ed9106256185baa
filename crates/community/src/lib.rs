//! `agriconnect-community`: community blog and educational resources.

pub mod blog;
pub mod resource;

pub use blog::{BlogPost, Moderation, VIOLATION_NOTE};
pub use resource::{Resource, ResourceDraft};
