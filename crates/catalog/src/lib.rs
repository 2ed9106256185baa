//! `agriconnect-catalog`: product taxonomy and marketplace listings.

pub mod category;
pub mod listing;

pub use category::{Category, CategoryStatus};
pub use listing::{Listing, ListingDraft, ListingKind};
