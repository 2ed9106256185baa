use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agriconnect_auth::{OwnedRecord, ProducerRole, RecordKind};
use agriconnect_core::{CategoryId, DomainError, DomainResult, ListingId, UserId};

/// Which marketplace a listing belongs to.
///
/// Farmers post farm products; GreenTech vendors post green-technology
/// products. The two are stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Farm,
    GreenTech,
}

impl ListingKind {
    pub fn for_role(role: ProducerRole) -> Self {
        match role {
            ProducerRole::Farmer => ListingKind::Farm,
            ProducerRole::GreenTech => ListingKind::GreenTech,
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            ListingKind::Farm => RecordKind::FarmProduct,
            ListingKind::GreenTech => RecordKind::GreenTechProduct,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Farm => "farm",
            ListingKind::GreenTech => "greentech",
        }
    }
}

/// A product offered on one of the marketplaces.
///
/// `user_id` is fixed at creation. `user_name` is a copy of the owner's name
/// at posting time and is not refreshed when the user is renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub kind: ListingKind,
    pub user_id: UserId,
    pub user_name: String,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub category_id: CategoryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<Vec<u8>>,
    pub date_posted: DateTime<Utc>,
}

/// Submitted fields for creating or updating a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub category_id: CategoryId,
    pub image: Option<Vec<u8>>,
}

impl ListingDraft {
    pub fn validated(self) -> DomainResult<Self> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Product name is required."));
        }
        if self.quantity < 0 {
            return Err(DomainError::validation("Quantity cannot be negative."));
        }
        Ok(Self {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            image: self.image.filter(|bytes| !bytes.is_empty()),
            ..self
        })
    }
}

impl Listing {
    pub fn create(
        kind: ListingKind,
        owner: UserId,
        owner_name: impl Into<String>,
        draft: ListingDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ListingId::new(),
            kind,
            user_id: owner,
            user_name: owner_name.into(),
            name: draft.name,
            description: draft.description,
            quantity: draft.quantity,
            category_id: draft.category_id,
            image: draft.image,
            date_posted: now,
        }
    }

    /// Overwrite the editable fields. The image is replaced only when a new one
    /// was uploaded. Owner and posting date never change.
    pub fn apply_update(&mut self, draft: ListingDraft) {
        self.name = draft.name;
        self.description = draft.description;
        self.quantity = draft.quantity;
        self.category_id = draft.category_id;
        if let Some(image) = draft.image {
            self.image = Some(image);
        }
    }

    pub fn owned_record(&self) -> OwnedRecord {
        OwnedRecord::new(self.kind.record_kind(), Some(self.user_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, quantity: i32, image: Option<Vec<u8>>) -> ListingDraft {
        ListingDraft {
            name: name.to_string(),
            description: "Fresh".to_string(),
            quantity,
            category_id: CategoryId::new(),
            image,
        }
    }

    #[test]
    fn kind_follows_producer_role() {
        assert_eq!(ListingKind::for_role(ProducerRole::Farmer), ListingKind::Farm);
        assert_eq!(ListingKind::for_role(ProducerRole::GreenTech), ListingKind::GreenTech);
        assert_eq!(ListingKind::Farm.record_kind(), RecordKind::FarmProduct);
    }

    #[test]
    fn draft_requires_name_and_non_negative_quantity() {
        assert!(draft(" ", 1, None).validated().is_err());
        assert_eq!(
            draft("Maize", -1, None).validated().unwrap_err(),
            DomainError::validation("Quantity cannot be negative.")
        );
        assert!(draft("Maize", 0, None).validated().is_ok());
    }

    #[test]
    fn empty_upload_counts_as_no_image() {
        let d = draft("Maize", 1, Some(vec![])).validated().unwrap();
        assert_eq!(d.image, None);
    }

    #[test]
    fn update_keeps_owner_and_existing_image() {
        let owner = UserId::new("farmer-1");
        let mut listing = Listing::create(
            ListingKind::Farm,
            owner.clone(),
            "Jane",
            draft("Maize", 3, Some(vec![1, 2, 3])),
            Utc::now(),
        );
        let posted = listing.date_posted;

        listing.apply_update(draft("White Maize", 5, None));
        assert_eq!(listing.user_id, owner);
        assert_eq!(listing.date_posted, posted);
        assert_eq!(listing.name, "White Maize");
        assert_eq!(listing.image, Some(vec![1, 2, 3]));

        listing.apply_update(draft("White Maize", 5, Some(vec![9])));
        assert_eq!(listing.image, Some(vec![9]));
    }

    #[test]
    fn owned_record_carries_owner() {
        let listing = Listing::create(
            ListingKind::GreenTech,
            UserId::new("gt-1"),
            "Vendor",
            draft("Panel", 1, None),
            Utc::now(),
        );
        let record = listing.owned_record();
        assert_eq!(record.kind, RecordKind::GreenTechProduct);
        assert_eq!(record.owner, Some(UserId::new("gt-1")));
    }
}
