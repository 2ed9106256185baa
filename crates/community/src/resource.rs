use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agriconnect_core::{DomainError, DomainResult, ResourceId};

/// Educational resource published by employees.
///
/// `file_path` points into the upload area; the file lives exactly as long
/// as the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub title: String,
    pub description: String,
    pub file_path: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl ResourceDraft {
    pub fn validated(self) -> DomainResult<Self> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("Title is required."));
        }
        Ok(Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }
}

impl Resource {
    pub fn publish(draft: ResourceDraft, file_path: String, now: DateTime<Utc>) -> Self {
        Self {
            id: ResourceId::new(),
            title: draft.title,
            description: draft.description,
            file_path,
            upload_date: now,
        }
    }

    /// Title and description are editable; the file is not.
    pub fn update(&mut self, draft: ResourceDraft) {
        self.title = draft.title;
        self.description = draft.description;
    }
}
