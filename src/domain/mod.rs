//! Domain types for the admissions identity model.
//!
//! Identities (users, applicants, instructors) share one collection and one
//! set of credential rules. Subtypes are composed from [`BaseIdentity`] plus a
//! details struct rather than inheriting from it.

pub mod bootcamp;
pub mod identity;
pub mod validation;

pub use bootcamp::Bootcamp;
pub use identity::{
    Applicant, ApplicantDetails, ApplicantRole, ApplicantStatus, Assessment, BaseIdentity,
    Credentialed, Identity, IdentityKind, Instructor, InstructorDetails, InstructorRole, Role,
    Skillset, StatusName,
};
pub use validation::{FieldError, ValidationReport};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a stored document.
///
/// Identities and bootcamps are keyed by a random UUID rendered as text, the
/// same way the document store keys embedded and top-level records alike.
///
/// # Examples
///
/// ```rust
/// use campadmin::domain::RecordId;
///
/// let id = RecordId::from("5f1c");
/// assert_eq!(id.as_str(), "5f1c");
/// assert_eq!(id.to_string(), "5f1c");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = RecordId::generate();
        let b = RecordId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn record_id_serializes_as_plain_string() {
        let id = RecordId::from("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
