use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Applicant, Bootcamp, RecordId, ValidationReport};
use crate::services::identity_service::{IdentityError, NewIdentity};

#[derive(Debug, Error)]
pub enum BootcampError {
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Bootcamp not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationReport> for BootcampError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

impl From<sea_orm::DbErr> for BootcampError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<IdentityError> for BootcampError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Validation(report) => Self::Validation(report),
            IdentityError::Conflict(msg) => Self::Conflict(msg),
            IdentityError::Database(msg) => Self::Database(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for BootcampError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBootcamp {
    pub name: String,

    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Bootcamp cohorts and their embedded applicants.
#[async_trait::async_trait]
pub trait BootcampService: Send + Sync {
    /// Creates a cohort owned by `owner`.
    async fn create(
        &self,
        input: NewBootcamp,
        owner: Option<RecordId>,
    ) -> Result<Bootcamp, BootcampError>;

    /// All cohorts, newest first.
    async fn list(&self) -> Result<Vec<Bootcamp>, BootcampError>;

    async fn get(&self, id: &RecordId) -> Result<Bootcamp, BootcampError>;

    /// Registers an applicant directly inside a cohort.
    ///
    /// The embedded record goes through the same trimming, validation and
    /// credential hashing as a standalone applicant.
    ///
    /// # Errors
    ///
    /// Returns [`BootcampError::Conflict`] if the username is already used in
    /// the cohort or by a standalone identity, or if the cohort changed
    /// while the applicant was being added.
    async fn enroll_applicant(
        &self,
        camp_id: &RecordId,
        input: NewIdentity,
    ) -> Result<Applicant, BootcampError>;
}
