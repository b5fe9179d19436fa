//! Identity records: the shared base and the applicant/instructor variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::RecordId;
use crate::constants::LOCAL_PROVIDER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

fn default_roles() -> Vec<Role> {
    vec![Role::User]
}

/// Fields every identity carries, whatever its subtype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseIdentity {
    #[serde(rename = "_id")]
    pub id: RecordId,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    pub username: String,

    /// Stored credential hash, or plaintext until the next qualifying save.
    #[serde(default)]
    pub password: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,

    pub provider: String,

    #[serde(default)]
    pub provider_data: Value,

    #[serde(default)]
    pub additional_providers_data: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,

    pub created: DateTime<Utc>,

    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,

    /// Optimistic concurrency token of the stored row.
    #[serde(skip)]
    pub revision: i64,

    #[serde(skip)]
    password_modified: bool,
}

impl BaseIdentity {
    #[must_use]
    pub fn new(username: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: RecordId::generate(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            username: username.into(),
            password: String::new(),
            salt: None,
            provider: provider.into(),
            provider_data: Value::Object(Map::new()),
            additional_providers_data: Map::new(),
            updated: None,
            created: Utc::now(),
            roles: default_roles(),
            revision: 0,
            password_modified: false,
        }
    }

    /// A password-based identity.
    #[must_use]
    pub fn local(username: impl Into<String>) -> Self {
        Self::new(username, LOCAL_PROVIDER)
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        self.provider == LOCAL_PROVIDER
    }

    /// Replaces the password with a new plaintext.
    ///
    /// The plaintext stays in memory until the record is saved, at which
    /// point a fresh salt is drawn and the password is hashed.
    pub fn set_password(&mut self, plaintext: impl Into<String>) {
        self.password = plaintext.into();
        self.password_modified = true;
    }

    /// Whether the password field holds a plaintext set since the last save.
    #[must_use]
    pub const fn password_modified(&self) -> bool {
        self.password_modified
    }

    /// Clears the pending-plaintext marker once the password is hashed or stored.
    pub const fn mark_persisted(&mut self) {
        self.password_modified = false;
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Applies the trimming the stored schema performs on text fields.
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.first_name);
        trim_in_place(&mut self.last_name);
        trim_in_place(&mut self.email);
        trim_in_place(&mut self.username);
    }

    pub fn touch(&mut self) {
        self.updated = Some(Utc::now());
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicantRole {
    Applicant,
    Trainee,
    Fellow,
}

impl ApplicantRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Applicant => "applicant",
            Self::Trainee => "trainee",
            Self::Fellow => "fellow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructorRole {
    Instructor,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusName {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "rejected")]
    Rejected,
    #[serde(rename = "selected for bootcamp")]
    SelectedForBootcamp,
    #[serde(rename = "selected for interview")]
    SelectedForInterview,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantStatus {
    pub name: StatusName,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skillset {
    pub skill: String,

    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub name: String,

    pub date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<RecordId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<RecordId>,

    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApplicantDetails {
    pub test_score: Option<f64>,
    pub cv_path: Option<String>,
    pub photo_path: Option<String>,
    pub role: Option<ApplicantRole>,
    pub status: Option<ApplicantStatus>,
    pub portfolio: Option<String>,
    pub skill_sets: Vec<Skillset>,
    pub profile: Option<String>,
    pub camp_id: Option<RecordId>,
    pub assessments: Vec<Assessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applicant {
    #[serde(flatten)]
    pub identity: BaseIdentity,

    #[serde(flatten)]
    pub details: ApplicantDetails,
}

impl Applicant {
    /// New applicant in the `applicant` role with a pending status.
    #[must_use]
    pub fn new(identity: BaseIdentity) -> Self {
        Self {
            identity,
            details: ApplicantDetails {
                role: Some(ApplicantRole::Applicant),
                status: Some(ApplicantStatus {
                    name: StatusName::Pending,
                    reason: None,
                }),
                ..ApplicantDetails::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstructorDetails {
    pub skill_sets: Vec<Skillset>,
    pub experience: Option<String>,
    pub photo: Option<String>,
    pub role: Option<InstructorRole>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    #[serde(flatten)]
    pub identity: BaseIdentity,

    #[serde(flatten)]
    pub details: InstructorDetails,
}

impl Instructor {
    #[must_use]
    pub fn new(identity: BaseIdentity, role: InstructorRole) -> Self {
        Self {
            identity,
            details: InstructorDetails {
                role: Some(role),
                ..InstructorDetails::default()
            },
        }
    }
}

/// Discriminator stored alongside each identity in the shared collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKind {
    User,
    Applicant,
    Instructor,
}

impl IdentityKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Applicant => "Applicant",
            Self::Instructor => "Instructor",
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Applicant" => Ok(Self::Applicant),
            "Instructor" => Ok(Self::Instructor),
            other => Err(format!("Unknown identity kind: {other}")),
        }
    }
}

/// Any record stored in the identity collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum Identity {
    User(BaseIdentity),
    Applicant(Applicant),
    Instructor(Instructor),
}

impl Identity {
    #[must_use]
    pub const fn kind(&self) -> IdentityKind {
        match self {
            Self::User(_) => IdentityKind::User,
            Self::Applicant(_) => IdentityKind::Applicant,
            Self::Instructor(_) => IdentityKind::Instructor,
        }
    }

    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.identity().id
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.identity().username
    }

    /// Admins are instructors in the admin role, or anyone holding the admin
    /// role tag.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        if self.identity().has_role(Role::Admin) {
            return true;
        }
        matches!(
            self,
            Self::Instructor(i) if i.details.role == Some(InstructorRole::Admin)
        )
    }

    #[must_use]
    pub const fn as_applicant(&self) -> Option<&Applicant> {
        match self {
            Self::Applicant(a) => Some(a),
            _ => None,
        }
    }

    pub const fn as_applicant_mut(&mut self) -> Option<&mut Applicant> {
        match self {
            Self::Applicant(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_instructor(&self) -> Option<&Instructor> {
        match self {
            Self::Instructor(i) => Some(i),
            _ => None,
        }
    }
}

/// Anything bearing username, password and salt fields.
///
/// Credential hashing, authentication and validation are written once against
/// this trait and apply equally to top-level and embedded records.
pub trait Credentialed {
    fn identity(&self) -> &BaseIdentity;

    fn identity_mut(&mut self) -> &mut BaseIdentity;
}

impl Credentialed for BaseIdentity {
    fn identity(&self) -> &BaseIdentity {
        self
    }

    fn identity_mut(&mut self) -> &mut BaseIdentity {
        self
    }
}

impl Credentialed for Applicant {
    fn identity(&self) -> &BaseIdentity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut BaseIdentity {
        &mut self.identity
    }
}

impl Credentialed for Instructor {
    fn identity(&self) -> &BaseIdentity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut BaseIdentity {
        &mut self.identity
    }
}

impl Credentialed for Identity {
    fn identity(&self) -> &BaseIdentity {
        match self {
            Self::User(u) => u,
            Self::Applicant(a) => &a.identity,
            Self::Instructor(i) => &i.identity,
        }
    }

    fn identity_mut(&mut self) -> &mut BaseIdentity {
        match self {
            Self::User(u) => u,
            Self::Applicant(a) => &mut a.identity,
            Self::Instructor(i) => &mut i.identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identity_defaults_to_user_role() {
        let base = BaseIdentity::local("ada");
        assert!(base.is_local());
        assert_eq!(base.roles, vec![Role::User]);
        assert!(base.salt.is_none());
        assert!(!base.password_modified());
    }

    #[test]
    fn set_password_marks_field_modified() {
        let mut base = BaseIdentity::local("ada");
        base.set_password("secret-pass");
        assert!(base.password_modified());
        base.mark_persisted();
        assert!(!base.password_modified());
        assert_eq!(base.password, "secret-pass");
    }

    #[test]
    fn normalize_trims_text_fields() {
        let mut base = BaseIdentity::local("  ada ");
        base.first_name = " Ada".to_string();
        base.email = "ada@example.com  ".to_string();
        base.normalize();
        assert_eq!(base.username, "ada");
        assert_eq!(base.first_name, "Ada");
        assert_eq!(base.email, "ada@example.com");
    }

    #[test]
    fn admin_detection_covers_role_tag_and_instructor_role() {
        let plain = Identity::User(BaseIdentity::local("u"));
        assert!(!plain.is_admin());

        let instructor = Identity::Instructor(Instructor::new(
            BaseIdentity::local("i"),
            InstructorRole::Admin,
        ));
        assert!(instructor.is_admin());

        let mut tagged = BaseIdentity::local("t");
        tagged.roles.push(Role::Admin);
        assert!(Identity::User(tagged).is_admin());
    }

    #[test]
    fn identity_document_carries_discriminator() {
        let mut applicant = Applicant::new(BaseIdentity::local("grace"));
        applicant.details.test_score = Some(72.0);
        let doc = serde_json::to_value(Identity::Applicant(applicant.clone())).unwrap();

        assert_eq!(doc["_type"], "Applicant");
        assert_eq!(doc["username"], "grace");
        assert_eq!(doc["testScore"], 72.0);
        assert_eq!(doc["status"]["name"], "pending");

        let back: Identity = serde_json::from_value(doc).unwrap();
        assert_eq!(back.kind(), IdentityKind::Applicant);
        assert_eq!(back.as_applicant().unwrap().details, applicant.details);
    }

    #[test]
    fn identity_kind_parses_discriminator() {
        assert_eq!("Instructor".parse::<IdentityKind>(), Ok(IdentityKind::Instructor));
        assert!("Admin".parse::<IdentityKind>().is_err());
    }

    #[test]
    fn credentialed_reaches_base_through_every_variant() {
        let mut identity = Identity::Instructor(Instructor::new(
            BaseIdentity::local("linus"),
            InstructorRole::Instructor,
        ));
        identity.identity_mut().email = "l@example.com".to_string();
        assert_eq!(identity.identity().email, "l@example.com");
        assert_eq!(identity.username(), "linus");
    }
}
