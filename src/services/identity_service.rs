//! Domain service for identity registration, sign-in and administration.
//!
//! Every write goes through one save pipeline: trim, validate, rotate the
//! salt when a new password was set, then a revision-checked write.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    ApplicantRole, ApplicantStatus, Assessment, Identity, IdentityKind, RecordId,
    ValidationReport,
};
use crate::services::username::UsernameError;

/// Errors specific to identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Expected {expected} but found {found}")]
    KindMismatch {
        expected: IdentityKind,
        found: IdentityKind,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Username(#[from] UsernameError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationReport> for IdentityError {
    fn from(report: ValidationReport) -> Self {
        Self::Validation(report)
    }
}

impl From<sea_orm::DbErr> for IdentityError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for IdentityError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IdentityError {
    pub fn validation(field: &str, message: &str) -> Self {
        let mut report = ValidationReport::new();
        report.push(field, message);
        Self::Validation(report)
    }
}

/// Input for local (password) registration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIdentity {
    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    pub username: String,

    pub password: String,

    /// Required when registering an applicant.
    #[serde(default)]
    pub test_score: Option<f64>,
}

/// Profile handed over by an external identity provider on login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderProfile {
    pub provider: String,

    /// The account id at the provider.
    pub subject: String,

    /// Preferred username; a numeric suffix is appended if it is taken.
    pub username: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub provider_data: Value,
}

/// Admin listing categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityFilter {
    Applicants,
    Trainees,
    Fellows,
    Instructors,
    Admins,
}

/// Domain service trait for identities.
#[async_trait::async_trait]
pub trait IdentityService: Send + Sync {
    /// Registers a local identity of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Validation`] for missing or malformed fields and
    /// [`IdentityError::Conflict`] if the username is taken.
    async fn register(
        &self,
        kind: IdentityKind,
        input: NewIdentity,
    ) -> Result<Identity, IdentityError>;

    /// Registers an instructor holding the admin role.
    async fn create_admin(&self, input: NewIdentity) -> Result<Identity, IdentityError>;

    /// Verifies a local username/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] for an unknown username or
    /// a wrong password.
    async fn sign_in(&self, username: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Finds the identity linked to a provider account, creating it on first
    /// login under a freshly resolved unique username.
    async fn sign_in_with_provider(
        &self,
        profile: ProviderProfile,
    ) -> Result<Identity, IdentityError>;

    /// Replaces the password after checking the current one.
    async fn change_password(
        &self,
        id: &RecordId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), IdentityError>;

    /// First unused username among `base`, `base1`, `base2`, ...
    async fn resolve_username(&self, base: &str) -> Result<String, IdentityError>;

    async fn get(&self, id: &RecordId) -> Result<Identity, IdentityError>;

    async fn list(&self, filter: IdentityFilter) -> Result<Vec<Identity>, IdentityError>;

    async fn delete(&self, id: &RecordId) -> Result<(), IdentityError>;

    async fn change_applicant_role(
        &self,
        id: &RecordId,
        role: ApplicantRole,
    ) -> Result<Identity, IdentityError>;

    async fn change_applicant_status(
        &self,
        id: &RecordId,
        status: ApplicantStatus,
    ) -> Result<Identity, IdentityError>;

    /// Sets the rating of a skill, adding the skill if it is not listed yet.
    async fn rate_skill(
        &self,
        id: &RecordId,
        skill: &str,
        rating: f64,
    ) -> Result<Identity, IdentityError>;

    async fn add_assessment(
        &self,
        id: &RecordId,
        assessment: Assessment,
    ) -> Result<Identity, IdentityError>;
}
