use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agriconnect_core::{DomainError, DomainResult, PostId, UserId};

/// Note attached to every post flagged by a moderator.
pub const VIOLATION_NOTE: &str = "This post was removed due to community guideline violation.";

/// Moderation state of a blog post.
///
/// ```text
/// Visible ──flag──► Violation(note) ──restore──► Visible
/// ```
///
/// Both transitions are idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Moderation {
    Visible,
    Violation { note: String },
}

impl Moderation {
    /// Rebuild from the stored flag/note columns.
    pub fn from_parts(is_violation: bool, note: Option<String>) -> Self {
        if is_violation {
            Moderation::Violation {
                note: note.unwrap_or_else(|| VIOLATION_NOTE.to_string()),
            }
        } else {
            Moderation::Visible
        }
    }

    pub fn is_violation(&self) -> bool {
        matches!(self, Moderation::Violation { .. })
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            Moderation::Visible => None,
            Moderation::Violation { note } => Some(note),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: PostId,
    pub user_id: UserId,
    /// Author name at posting time; not refreshed on rename.
    pub user_name: String,
    pub message: String,
    pub image_path: Option<String>,
    pub date_posted: DateTime<Utc>,
    pub moderation: Moderation,
}

impl BlogPost {
    pub fn compose(
        author: UserId,
        author_name: impl Into<String>,
        message: &str,
        image_path: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if message.trim().is_empty() {
            return Err(DomainError::validation("Message cannot be empty."));
        }
        Ok(Self {
            id: PostId::new(),
            user_id: author,
            user_name: author_name.into(),
            message: message.trim().to_string(),
            image_path,
            date_posted: now,
            moderation: Moderation::Visible,
        })
    }

    /// Mark as a community-guideline violation. Re-flagging overwrites the note.
    pub fn flag_violation(&mut self) {
        self.moderation = Moderation::Violation {
            note: VIOLATION_NOTE.to_string(),
        };
    }

    /// Make the post visible again. Returns whether anything changed.
    pub fn restore(&mut self) -> bool {
        let changed = self.moderation.is_violation();
        self.moderation = Moderation::Visible;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> BlogPost {
        BlogPost::compose(UserId::new("u1"), "Jane", "Rain expected this week", None, Utc::now()).unwrap()
    }

    #[test]
    fn new_posts_are_visible() {
        let p = post();
        assert_eq!(p.moderation, Moderation::Visible);
        assert_eq!(p.moderation.note(), None);
    }

    #[test]
    fn empty_message_is_rejected() {
        let err = BlogPost::compose(UserId::new("u1"), "Jane", "   ", None, Utc::now()).unwrap_err();
        assert_eq!(err, DomainError::validation("Message cannot be empty."));
    }

    #[test]
    fn flagging_twice_keeps_the_fixed_note() {
        let mut p = post();
        p.flag_violation();
        p.moderation = Moderation::Violation {
            note: "edited by hand".to_string(),
        };
        p.flag_violation();
        assert!(p.moderation.is_violation());
        assert_eq!(p.moderation.note(), Some(VIOLATION_NOTE));
    }

    #[test]
    fn restore_clears_note_and_is_idempotent() {
        let mut p = post();
        p.flag_violation();
        assert!(p.restore());
        assert_eq!(p.moderation, Moderation::Visible);

        let before = p.clone();
        assert!(!p.restore());
        assert_eq!(p, before);
    }

    #[test]
    fn stored_parts_rebuild_moderation() {
        assert_eq!(Moderation::from_parts(false, Some("x".into())), Moderation::Visible);
        assert_eq!(
            Moderation::from_parts(true, None).note(),
            Some(VIOLATION_NOTE)
        );
    }
}
