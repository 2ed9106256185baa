use core::str::FromStr;

use serde::{Deserialize, Serialize};

use agriconnect_auth::ProducerRole;
use agriconnect_core::{CategoryId, DomainError, DomainResult};

/// Category approval lifecycle.
///
/// ```text
/// Pending ──► Approved
///    └──────► Rejected
/// ```
///
/// Approved and Rejected are terminal. Re-applying the current status is a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryStatus {
    Pending,
    Approved,
    Rejected,
}

impl CategoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryStatus::Pending => "Pending",
            CategoryStatus::Approved => "Approved",
            CategoryStatus::Rejected => "Rejected",
        }
    }

    /// Transition table guard.
    pub fn can_transition_to(self, to: CategoryStatus) -> bool {
        use CategoryStatus::*;
        matches!(
            (self, to),
            (Pending, Pending)
                | (Pending, Approved)
                | (Pending, Rejected)
                | (Approved, Approved)
                | (Rejected, Rejected)
        )
    }
}

impl core::fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(CategoryStatus::Pending),
            "Approved" => Ok(CategoryStatus::Approved),
            "Rejected" => Ok(CategoryStatus::Rejected),
            other => Err(DomainError::validation(format!(
                "status must be one of: Pending, Approved, Rejected (got '{other}')"
            ))),
        }
    }
}

/// A product category requested by a producer and moderated by employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub status: CategoryStatus,
    pub requestor_role: ProducerRole,
}

impl Category {
    /// A new category request. Always starts `Pending`.
    pub fn request(name: &str, requestor_role: ProducerRole) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("Category name is required."));
        }
        Ok(Self {
            id: CategoryId::new(),
            name: name.to_string(),
            status: CategoryStatus::Pending,
            requestor_role,
        })
    }

    /// Apply an employee-issued status change.
    ///
    /// Returns whether the status actually changed.
    pub fn transition_to(&mut self, to: CategoryStatus) -> DomainResult<bool> {
        if !self.status.can_transition_to(to) {
            return Err(DomainError::invariant(format!(
                "category '{}' cannot move from {} to {}",
                self.name, self.status, to
            )));
        }
        let changed = self.status != to;
        self.status = to;
        Ok(changed)
    }

    /// Whether producers of `role` may pick this category for a listing.
    pub fn is_offered_to(&self, role: ProducerRole) -> bool {
        self.status == CategoryStatus::Approved && self.requestor_role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn requests_start_pending() {
        let c = Category::request("Vegetables", ProducerRole::Farmer).unwrap();
        assert_eq!(c.status, CategoryStatus::Pending);
        assert!(!c.is_offered_to(ProducerRole::Farmer));
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(
            Category::request("  ", ProducerRole::Farmer).unwrap_err(),
            DomainError::validation("Category name is required.")
        );
    }

    #[test]
    fn approval_offers_category_to_matching_role_only() {
        let mut c = Category::request("Solar Panels", ProducerRole::GreenTech).unwrap();
        assert_eq!(c.transition_to(CategoryStatus::Approved), Ok(true));
        assert!(c.is_offered_to(ProducerRole::GreenTech));
        assert!(!c.is_offered_to(ProducerRole::Farmer));
    }

    #[test]
    fn approved_cannot_go_back_to_pending() {
        let mut c = Category::request("Grain", ProducerRole::Farmer).unwrap();
        c.transition_to(CategoryStatus::Approved).unwrap();
        let err = c.transition_to(CategoryStatus::Pending).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(c.status, CategoryStatus::Approved);
    }

    #[test]
    fn rejected_is_terminal() {
        let mut c = Category::request("Grain", ProducerRole::Farmer).unwrap();
        c.transition_to(CategoryStatus::Rejected).unwrap();
        assert!(c.transition_to(CategoryStatus::Approved).is_err());
        assert!(!c.is_offered_to(ProducerRole::Farmer));
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut c = Category::request("Grain", ProducerRole::Farmer).unwrap();
        c.transition_to(CategoryStatus::Approved).unwrap();
        assert_eq!(c.transition_to(CategoryStatus::Approved), Ok(false));
    }

    #[test]
    fn status_parsing_is_exact() {
        assert_eq!("Approved".parse::<CategoryStatus>().unwrap(), CategoryStatus::Approved);
        assert!("approved".parse::<CategoryStatus>().is_err());
    }

    fn any_status() -> impl Strategy<Value = CategoryStatus> {
        prop_oneof![
            Just(CategoryStatus::Pending),
            Just(CategoryStatus::Approved),
            Just(CategoryStatus::Rejected),
        ]
    }

    proptest! {
        /// Property: a rejected transition leaves the category untouched.
        #[test]
        fn failed_transition_does_not_mutate(from in any_status(), to in any_status()) {
            let mut c = Category::request("Fruit", ProducerRole::Farmer).unwrap();
            c.status = from;
            let before = c.clone();
            if c.transition_to(to).is_err() {
                prop_assert_eq!(c, before);
            } else {
                prop_assert_eq!(c.status, to);
            }
        }

        /// Property: nothing ever leads back to Pending from another status.
        #[test]
        fn pending_is_never_re_entered(from in any_status()) {
            prop_assume!(from != CategoryStatus::Pending);
            prop_assert!(!from.can_transition_to(CategoryStatus::Pending));
        }
    }
}
