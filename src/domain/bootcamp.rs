use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Applicant, RecordId};

/// A bootcamp cohort with its applicants embedded as full documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    #[serde(rename = "_id")]
    pub id: RecordId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    pub created: DateTime<Utc>,

    #[serde(default)]
    pub applicants: Vec<Applicant>,

    /// Owning admin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<RecordId>,

    #[serde(skip)]
    pub revision: i64,
}

impl Bootcamp {
    #[must_use]
    pub fn new(name: impl Into<String>, owner: Option<RecordId>) -> Self {
        Self {
            id: RecordId::generate(),
            name: name.into(),
            start_date: None,
            end_date: None,
            created: Utc::now(),
            applicants: Vec::new(),
            user: owner,
            revision: 0,
        }
    }

    pub fn normalize(&mut self) {
        let trimmed = self.name.trim();
        if trimmed.len() != self.name.len() {
            self.name = trimmed.to_string();
        }
        for applicant in &mut self.applicants {
            applicant.identity.normalize();
        }
    }

    #[must_use]
    pub fn applicant(&self, id: &RecordId) -> Option<&Applicant> {
        self.applicants.iter().find(|a| &a.identity.id == id)
    }

    #[must_use]
    pub fn has_username(&self, username: &str) -> bool {
        self.applicants
            .iter()
            .any(|a| a.identity.username == username)
    }
}
