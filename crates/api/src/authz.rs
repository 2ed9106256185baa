//! Ownership checks for listing mutations.
//!
//! The route gate already enforced the role; this runs the same gate function
//! against the looked-up record.

use agriconnect_auth::{AuthzError, Capability, OwnedRecord, SessionState, authorize};
use agriconnect_catalog::{Listing, ListingKind};

/// Allow only the owner. Missing and foreign listings both yield `NotFound`.
pub fn authorize_owner(
    session: &SessionState,
    kind: ListingKind,
    listing: Option<&Listing>,
) -> Result<(), AuthzError> {
    let record = listing
        .map(Listing::owned_record)
        .unwrap_or_else(|| OwnedRecord::missing(kind.record_kind()));
    authorize(Some(session), &Capability::OwnerOf(record))
}
