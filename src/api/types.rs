use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    Applicant, ApplicantDetails, BaseIdentity, Bootcamp, Credentialed, Identity, IdentityKind,
    InstructorDetails, Role,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
}

/// Public view of an identity. Credential fields are never part of it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDto {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub kind: IdentityKind,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub provider: String,
    pub roles: Vec<Role>,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub applicant: Option<ApplicantDetails>,
    #[serde(flatten)]
    pub instructor: Option<InstructorDetails>,
}

impl IdentityDto {
    fn from_base(kind: IdentityKind, base: &BaseIdentity) -> Self {
        Self {
            id: base.id.to_string(),
            kind,
            username: base.username.clone(),
            first_name: base.first_name.clone(),
            last_name: base.last_name.clone(),
            email: base.email.clone(),
            provider: base.provider.clone(),
            roles: base.roles.clone(),
            created: base.created,
            updated: base.updated,
            applicant: None,
            instructor: None,
        }
    }
}

impl From<&Identity> for IdentityDto {
    fn from(identity: &Identity) -> Self {
        let mut dto = Self::from_base(identity.kind(), identity.identity());
        match identity {
            Identity::User(_) => {}
            Identity::Applicant(a) => dto.applicant = Some(a.details.clone()),
            Identity::Instructor(i) => dto.instructor = Some(i.details.clone()),
        }
        dto
    }
}

impl From<&Applicant> for IdentityDto {
    fn from(applicant: &Applicant) -> Self {
        let mut dto = Self::from_base(IdentityKind::Applicant, &applicant.identity);
        dto.applicant = Some(applicant.details.clone());
        dto
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootcampDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub user: Option<String>,
    pub applicants: Vec<IdentityDto>,
}

impl From<&Bootcamp> for BootcampDto {
    fn from(camp: &Bootcamp) -> Self {
        Self {
            id: camp.id.to_string(),
            name: camp.name.clone(),
            start_date: camp.start_date,
            end_date: camp.end_date,
            created: camp.created,
            user: camp.user.as_ref().map(ToString::to_string),
            applicants: camp.applicants.iter().map(IdentityDto::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BaseIdentity, Instructor, InstructorRole};

    #[test]
    fn identity_dto_omits_credentials() {
        let mut base = BaseIdentity::local("ada");
        base.password = "hashed".to_string();
        base.salt = Some("c2FsdA==".to_string());
        let mut applicant = Applicant::new(base);
        applicant.details.test_score = Some(55.0);

        let json = serde_json::to_value(IdentityDto::from(&Identity::Applicant(applicant))).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("salt").is_none());
        assert_eq!(json["_type"], "Applicant");
        assert_eq!(json["testScore"], 55.0);
    }

    #[test]
    fn instructor_dto_carries_instructor_role() {
        let identity = Identity::Instructor(Instructor::new(
            BaseIdentity::local("linus"),
            InstructorRole::Admin,
        ));
        let json = serde_json::to_value(IdentityDto::from(&identity)).unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("testScore").is_none());
    }

    #[test]
    fn bootcamp_dto_hides_embedded_credentials() {
        let mut camp = Bootcamp::new("Cohort 7", None);
        let mut base = BaseIdentity::local("grace");
        base.password = "hashed".to_string();
        base.salt = Some("c2FsdA==".to_string());
        camp.applicants.push(Applicant::new(base));

        let json = serde_json::to_value(BootcampDto::from(&camp)).unwrap();
        assert_eq!(json["name"], "Cohort 7");
        assert!(json["applicants"][0].get("password").is_none());
        assert!(json["applicants"][0].get("salt").is_none());
    }
}
