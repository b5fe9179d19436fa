//! Record validation.
//!
//! Every rule takes the full record as a parameter; nothing reads ambient
//! state. A [`ValidationReport`] lists each failing field with its message.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use super::{Applicant, Assessment, Bootcamp, Credentialed, Identity, Instructor};
use crate::constants::hashing::MIN_PASSWORD_LEN_EXCLUSIVE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    #[must_use]
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Folds another report in, prefixing its field paths.
    pub fn merge_prefixed(&mut self, prefix: &str, other: Self) {
        for err in other.errors {
            self.errors.push(FieldError {
                field: format!("{prefix}.{}", err.field),
                message: err.message,
            });
        }
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

fn email_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r".+@.+\..+").expect("Invalid regex"))
}

/// Profile fields are mandatory for local accounts. Provider accounts are
/// exempt until their profile has been edited once.
fn profile_field_ok<C: Credentialed + ?Sized>(record: &C, value: &str) -> bool {
    let base = record.identity();
    (!base.is_local() && base.updated.is_none()) || !value.is_empty()
}

fn password_ok<C: Credentialed + ?Sized>(record: &C) -> bool {
    let base = record.identity();
    !base.is_local() || base.password.chars().count() > MIN_PASSWORD_LEN_EXCLUSIVE
}

/// Rules shared by every identity subtype.
#[must_use]
pub fn validate_identity<C: Credentialed + ?Sized>(record: &C) -> ValidationReport {
    let base = record.identity();
    let mut report = ValidationReport::new();

    if !profile_field_ok(record, &base.first_name) {
        report.push("firstName", "Please fill in your first name");
    }
    if !profile_field_ok(record, &base.last_name) {
        report.push("lastName", "Please fill in your last name");
    }
    if !profile_field_ok(record, &base.email) {
        report.push("email", "Please fill in your email");
    } else if !base.email.is_empty() && !email_pattern().is_match(&base.email) {
        report.push("email", "Please fill a valid email address");
    }
    if base.username.trim().is_empty() {
        report.push("username", "Please fill in a username");
    }
    if !password_ok(record) {
        report.push("password", "Password should be longer");
    }
    if base.provider.trim().is_empty() {
        report.push("provider", "Provider is required");
    }

    report
}

#[must_use]
pub fn validate_assessment(assessment: &Assessment) -> ValidationReport {
    let mut report = ValidationReport::new();
    if assessment.name.trim().is_empty() {
        report.push("name", "Name of assessment is important");
    }
    if !assessment.score.is_finite() {
        report.push("score", "The Applicant score is compulsory");
    }
    report
}

#[must_use]
pub fn validate_applicant(applicant: &Applicant) -> ValidationReport {
    let mut report = validate_identity(applicant);

    if applicant.details.test_score.is_none() {
        report.push("testScore", "Applicant score must be submitted");
    }

    for (index, assessment) in applicant.details.assessments.iter().enumerate() {
        report.merge_prefixed(
            &format!("assessments[{index}]"),
            validate_assessment(assessment),
        );
    }

    report
}

#[must_use]
pub fn validate_instructor(instructor: &Instructor) -> ValidationReport {
    validate_identity(instructor)
}

#[must_use]
pub fn validate(identity: &Identity) -> ValidationReport {
    match identity {
        Identity::User(user) => validate_identity(user),
        Identity::Applicant(applicant) => validate_applicant(applicant),
        Identity::Instructor(instructor) => validate_instructor(instructor),
    }
}

#[must_use]
pub fn validate_bootcamp(camp: &Bootcamp) -> ValidationReport {
    let mut report = ValidationReport::new();

    if camp.name.trim().is_empty() {
        report.push("name", "Please fill in the Bootcamp name");
    }
    if let (Some(start), Some(end)) = (camp.start_date, camp.end_date)
        && end < start
    {
        report.push("endDate", "End date must not be before start date");
    }

    for (index, applicant) in camp.applicants.iter().enumerate() {
        report.merge_prefixed(&format!("applicants[{index}]"), validate_applicant(applicant));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BaseIdentity, RecordId};
    use chrono::{Duration, Utc};

    fn local_user() -> BaseIdentity {
        let mut base = BaseIdentity::local("ada");
        base.first_name = "Ada".to_string();
        base.last_name = "Lovelace".to_string();
        base.email = "ada@example.com".to_string();
        base.set_password("analytical");
        base
    }

    #[test]
    fn complete_local_identity_is_valid() {
        assert!(validate_identity(&local_user()).is_valid());
    }

    #[test]
    fn local_identity_requires_profile_fields() {
        let mut base = local_user();
        base.first_name.clear();
        base.email.clear();

        let report = validate_identity(&base);
        assert!(report.has_error("firstName"));
        assert!(report.has_error("email"));
        assert!(!report.has_error("lastName"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut base = local_user();
        base.email = "not-an-email".to_string();
        let report = validate_identity(&base);
        assert_eq!(report.errors()[0].message, "Please fill a valid email address");
    }

    #[test]
    fn local_password_must_exceed_six_characters() {
        let mut base = local_user();
        base.set_password("123456");
        assert!(validate_identity(&base).has_error("password"));

        base.set_password("1234567");
        assert!(validate_identity(&base).is_valid());
    }

    #[test]
    fn provider_identity_is_exempt_until_updated() {
        let mut base = BaseIdentity::new("octocat", "github");
        assert!(validate_identity(&base).is_valid());

        base.touch();
        let report = validate_identity(&base);
        assert!(report.has_error("firstName"));
        assert!(!report.has_error("password"));
    }

    #[test]
    fn applicant_requires_test_score_and_named_assessments() {
        let mut applicant = Applicant::new(local_user());
        let report = validate_applicant(&applicant);
        assert!(report.has_error("testScore"));

        applicant.details.test_score = Some(80.0);
        applicant.details.assessments.push(Assessment {
            name: "  ".to_string(),
            date: Utc::now(),
            applicant_id: Some(applicant.identity.id.clone()),
            instructor_id: None,
            score: 4.0,
        });
        let report = validate_applicant(&applicant);
        assert!(report.has_error("assessments[0].name"));
        assert!(!report.has_error("testScore"));
    }

    #[test]
    fn bootcamp_checks_name_dates_and_embedded_applicants() {
        let mut camp = Bootcamp::new(" ", Some(RecordId::from("admin")));
        let now = Utc::now();
        camp.start_date = Some(now);
        camp.end_date = Some(now - Duration::days(1));
        camp.applicants.push(Applicant::new(BaseIdentity::local("")));

        let report = validate_bootcamp(&camp);
        assert!(report.has_error("name"));
        assert!(report.has_error("endDate"));
        assert!(report.has_error("applicants[0].username"));
        assert!(report.to_string().contains("Please fill in the Bootcamp name"));
    }
}
