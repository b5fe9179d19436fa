//! `SeaORM` implementation of the `IdentityService` trait.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::db::{Store, WriteOutcome};
use crate::domain::validation;
use crate::domain::{
    Applicant, ApplicantRole, ApplicantStatus, Assessment, BaseIdentity, Credentialed, Identity,
    IdentityKind, Instructor, InstructorRole, RecordId, Role, Skillset,
};
use crate::services::credentials;
use crate::services::identity_service::{
    IdentityError, IdentityFilter, IdentityService, NewIdentity, ProviderProfile,
};
use crate::services::username::find_unique_username;

pub struct SeaOrmIdentityService {
    store: Store,
    username_max_attempts: Option<u32>,
}

impl SeaOrmIdentityService {
    #[must_use]
    pub const fn new(store: Store, username_max_attempts: Option<u32>) -> Self {
        Self {
            store,
            username_max_attempts,
        }
    }

    /// Trim, validate, hash a newly set password, then write.
    ///
    /// Updates only land if the stored revision is still the one that was
    /// read, so two concurrent saves of one identity cannot both draw a salt.
    pub(crate) async fn persist(&self, mut identity: Identity, is_new: bool) -> Result<Identity, IdentityError> {
        identity.identity_mut().normalize();
        if !is_new {
            identity.identity_mut().touch();
        }

        validation::validate(&identity).into_result()?;

        let mut identity = credentials::rotate_credentials_blocking(identity)
            .await
            .map_err(|e| IdentityError::Internal(format!("Password hashing task panicked: {e}")))?;

        let outcome = if is_new {
            self.store.insert_identity(&identity).await?
        } else {
            self.store.update_identity(&identity).await?
        };

        match outcome {
            WriteOutcome::Written => {}
            WriteOutcome::Stale => {
                return Err(IdentityError::Conflict(format!(
                    "{} was modified concurrently",
                    identity.username()
                )));
            }
            WriteOutcome::Duplicate => {
                return Err(IdentityError::Conflict(format!(
                    "Username '{}' already exists",
                    identity.username()
                )));
            }
        }

        let base = identity.identity_mut();
        if !is_new {
            base.revision += 1;
        }
        base.mark_persisted();

        Ok(identity)
    }

    async fn load(&self, id: &RecordId) -> Result<Identity, IdentityError> {
        self.store
            .get_identity(id)
            .await?
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))
    }

    async fn load_applicant(&self, id: &RecordId) -> Result<Identity, IdentityError> {
        let identity = self.load(id).await?;
        if identity.kind() != IdentityKind::Applicant {
            return Err(IdentityError::KindMismatch {
                expected: IdentityKind::Applicant,
                found: identity.kind(),
            });
        }
        Ok(identity)
    }
}

fn local_base(input: NewIdentity) -> BaseIdentity {
    let mut base = BaseIdentity::local(input.username);
    base.first_name = input.first_name;
    base.last_name = input.last_name;
    base.email = input.email;
    base.set_password(input.password);
    base
}

/// Provider data always records the external account id under `id`; the
/// stored `provider_subject` column is derived from it.
fn provider_data_with_subject(data: Value, subject: &str) -> Value {
    let mut map = match data {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("profile".to_string(), other);
            map
        }
    };
    if let Some(previous) = map.insert("id".to_string(), Value::String(subject.to_string())) {
        if previous.as_str() != Some(subject) {
            map.insert("providerId".to_string(), previous);
        }
    }
    Value::Object(map)
}

fn matches_filter(identity: &Identity, filter: IdentityFilter) -> bool {
    let applicant_role = identity
        .as_applicant()
        .map(|a| a.details.role.unwrap_or(ApplicantRole::Applicant));

    match filter {
        IdentityFilter::Applicants => applicant_role == Some(ApplicantRole::Applicant),
        IdentityFilter::Trainees => applicant_role == Some(ApplicantRole::Trainee),
        IdentityFilter::Fellows => applicant_role == Some(ApplicantRole::Fellow),
        IdentityFilter::Instructors => identity
            .as_instructor()
            .is_some_and(|i| i.details.role != Some(InstructorRole::Admin)),
        IdentityFilter::Admins => identity.is_admin(),
    }
}

#[async_trait]
impl IdentityService for SeaOrmIdentityService {
    async fn register(
        &self,
        kind: IdentityKind,
        input: NewIdentity,
    ) -> Result<Identity, IdentityError> {
        let test_score = input.test_score;
        let base = local_base(input);

        let identity = match kind {
            IdentityKind::User => Identity::User(base),
            IdentityKind::Applicant => {
                let mut applicant = Applicant::new(base);
                applicant.details.test_score = test_score;
                Identity::Applicant(applicant)
            }
            IdentityKind::Instructor => {
                Identity::Instructor(Instructor::new(base, InstructorRole::Instructor))
            }
        };

        let identity = self.persist(identity, true).await?;
        info!(username = %identity.username(), kind = %kind, "Registered identity");
        Ok(identity)
    }

    async fn create_admin(&self, input: NewIdentity) -> Result<Identity, IdentityError> {
        let mut base = local_base(input);
        base.roles = vec![Role::User, Role::Admin];

        let identity = Identity::Instructor(Instructor::new(base, InstructorRole::Admin));
        let identity = self.persist(identity, true).await?;
        info!(username = %identity.username(), "Created admin");
        Ok(identity)
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<Identity, IdentityError> {
        if password.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }

        let Some(identity) = self
            .store
            .get_identity_by_username(username.trim())
            .await?
        else {
            warn!(username, "Sign-in for unknown username");
            return Err(IdentityError::InvalidCredentials);
        };

        // Provider accounts carry no local password to check against.
        if !identity.identity().is_local() {
            warn!(username, provider = %identity.identity().provider, "Password sign-in for provider account");
            return Err(IdentityError::InvalidCredentials);
        }

        let (is_valid, identity) =
            credentials::authenticate_blocking(identity, password.to_string())
                .await
                .map_err(|e| {
                    IdentityError::Internal(format!("Password verification task panicked: {e}"))
                })?;

        if !is_valid {
            warn!(username, "Sign-in with wrong password");
            return Err(IdentityError::InvalidCredentials);
        }

        info!(username = %identity.username(), "Signed in");
        Ok(identity)
    }

    async fn sign_in_with_provider(
        &self,
        profile: ProviderProfile,
    ) -> Result<Identity, IdentityError> {
        if profile.provider.trim().is_empty() {
            return Err(IdentityError::validation("provider", "Provider is required"));
        }
        if profile.subject.trim().is_empty() {
            return Err(IdentityError::validation(
                "subject",
                "Provider account id is required",
            ));
        }

        if let Some(existing) = self
            .store
            .get_identity_by_provider(&profile.provider, &profile.subject)
            .await?
        {
            info!(username = %existing.username(), provider = %profile.provider, "Provider sign-in");
            return Ok(existing);
        }

        let username = self.resolve_username(&profile.username).await?;

        let mut base = BaseIdentity::new(username, profile.provider.clone());
        base.first_name = profile.first_name;
        base.last_name = profile.last_name;
        base.email = profile.email;
        base.provider_data = provider_data_with_subject(profile.provider_data, &profile.subject);

        match self.persist(Identity::User(base), true).await {
            Ok(identity) => {
                info!(
                    username = %identity.username(),
                    provider = %profile.provider,
                    "Created identity from provider login"
                );
                Ok(identity)
            }
            Err(IdentityError::Conflict(msg)) => {
                // A concurrent first login for the same account won the insert.
                self.store
                    .get_identity_by_provider(&profile.provider, &profile.subject)
                    .await?
                    .ok_or(IdentityError::Conflict(msg))
            }
            Err(e) => Err(e),
        }
    }

    async fn change_password(
        &self,
        id: &RecordId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        if current_password == new_password {
            return Err(IdentityError::validation(
                "newPassword",
                "New password must be different from current password",
            ));
        }

        let identity = self.load(id).await?;

        if current_password.is_empty() || !identity.identity().is_local() {
            return Err(IdentityError::validation(
                "currentPassword",
                "Current password is incorrect",
            ));
        }

        let (is_valid, mut identity) =
            credentials::authenticate_blocking(identity, current_password.to_string())
                .await
                .map_err(|e| {
                    IdentityError::Internal(format!("Password verification task panicked: {e}"))
                })?;

        if !is_valid {
            return Err(IdentityError::validation(
                "currentPassword",
                "Current password is incorrect",
            ));
        }

        identity.identity_mut().set_password(new_password);
        let identity = self.persist(identity, false).await?;

        info!(username = %identity.username(), "Password changed");
        Ok(())
    }

    async fn resolve_username(&self, base: &str) -> Result<String, IdentityError> {
        let base = base.trim();
        if base.is_empty() {
            return Err(IdentityError::validation(
                "username",
                "Please fill in a username",
            ));
        }

        Ok(find_unique_username(&self.store, base, None, self.username_max_attempts).await?)
    }

    async fn get(&self, id: &RecordId) -> Result<Identity, IdentityError> {
        self.load(id).await
    }

    async fn list(&self, filter: IdentityFilter) -> Result<Vec<Identity>, IdentityError> {
        let kinds: &[IdentityKind] = match filter {
            IdentityFilter::Applicants | IdentityFilter::Trainees | IdentityFilter::Fellows => {
                &[IdentityKind::Applicant]
            }
            IdentityFilter::Instructors => &[IdentityKind::Instructor],
            IdentityFilter::Admins => &[IdentityKind::Instructor, IdentityKind::User],
        };

        let mut result = Vec::new();
        for kind in kinds {
            let identities = self.store.list_identities(*kind).await?;
            result.extend(identities.into_iter().filter(|i| matches_filter(i, filter)));
        }

        Ok(result)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), IdentityError> {
        if !self.store.delete_identity(id).await? {
            return Err(IdentityError::NotFound(id.to_string()));
        }
        info!(id = %id, "Deleted identity");
        Ok(())
    }

    async fn change_applicant_role(
        &self,
        id: &RecordId,
        role: ApplicantRole,
    ) -> Result<Identity, IdentityError> {
        let mut identity = self.load_applicant(id).await?;
        if let Some(applicant) = identity.as_applicant_mut() {
            applicant.details.role = Some(role);
        }

        let identity = self.persist(identity, false).await?;
        info!(username = %identity.username(), role = role.as_str(), "Changed applicant role");
        Ok(identity)
    }

    async fn change_applicant_status(
        &self,
        id: &RecordId,
        status: ApplicantStatus,
    ) -> Result<Identity, IdentityError> {
        let mut identity = self.load_applicant(id).await?;
        if let Some(applicant) = identity.as_applicant_mut() {
            applicant.details.status = Some(status);
        }

        self.persist(identity, false).await
    }

    async fn rate_skill(
        &self,
        id: &RecordId,
        skill: &str,
        rating: f64,
    ) -> Result<Identity, IdentityError> {
        let skill = skill.trim();
        if skill.is_empty() {
            return Err(IdentityError::validation("skill", "Skill name is required"));
        }

        let mut identity = self.load(id).await?;
        let skill_sets = match &mut identity {
            Identity::Applicant(a) => &mut a.details.skill_sets,
            Identity::Instructor(i) => &mut i.details.skill_sets,
            Identity::User(_) => {
                return Err(IdentityError::KindMismatch {
                    expected: IdentityKind::Applicant,
                    found: IdentityKind::User,
                });
            }
        };

        match skill_sets.iter_mut().find(|s| s.skill == skill) {
            Some(existing) => existing.rating = Some(rating),
            None => skill_sets.push(Skillset {
                skill: skill.to_string(),
                rating: Some(rating),
            }),
        }

        self.persist(identity, false).await
    }

    async fn add_assessment(
        &self,
        id: &RecordId,
        mut assessment: Assessment,
    ) -> Result<Identity, IdentityError> {
        let mut identity = self.load_applicant(id).await?;
        assessment.applicant_id = Some(id.clone());

        if let Some(applicant) = identity.as_applicant_mut() {
            applicant.details.assessments.push(assessment);
        }

        self.persist(identity, false).await
    }
}
