use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{Store, WriteOutcome};
use crate::domain::validation;
use crate::domain::{Applicant, BaseIdentity, Bootcamp, Identity, RecordId};
use crate::services::bootcamp_service::{BootcampError, BootcampService, NewBootcamp};
use crate::services::identity_service::NewIdentity;
use crate::services::identity_service_impl::SeaOrmIdentityService;

pub struct SeaOrmBootcampService {
    store: Store,
    identities: SeaOrmIdentityService,
}

impl SeaOrmBootcampService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            identities: SeaOrmIdentityService::new(store.clone(), None),
            store,
        }
    }

    async fn load(&self, id: &RecordId) -> Result<Bootcamp, BootcampError> {
        self.store
            .get_bootcamp(id)
            .await?
            .ok_or_else(|| BootcampError::NotFound(id.to_string()))
    }
}

fn embedded_applicant(camp_id: &RecordId, input: NewIdentity) -> Applicant {
    let mut base = BaseIdentity::local(input.username);
    base.first_name = input.first_name;
    base.last_name = input.last_name;
    base.email = input.email;
    base.set_password(input.password);

    let mut applicant = Applicant::new(base);
    applicant.details.test_score = input.test_score;
    applicant.details.camp_id = Some(camp_id.clone());
    applicant
}

#[async_trait]
impl BootcampService for SeaOrmBootcampService {
    async fn create(
        &self,
        input: NewBootcamp,
        owner: Option<RecordId>,
    ) -> Result<Bootcamp, BootcampError> {
        let mut camp = Bootcamp::new(input.name, owner);
        camp.start_date = input.start_date;
        camp.end_date = input.end_date;
        camp.normalize();

        validation::validate_bootcamp(&camp).into_result()?;

        self.store.insert_bootcamp(&camp).await?;
        info!(name = %camp.name, id = %camp.id, "Created bootcamp");
        Ok(camp)
    }

    async fn list(&self) -> Result<Vec<Bootcamp>, BootcampError> {
        Ok(self.store.list_bootcamps().await?)
    }

    async fn get(&self, id: &RecordId) -> Result<Bootcamp, BootcampError> {
        self.load(id).await
    }

    async fn enroll_applicant(
        &self,
        camp_id: &RecordId,
        input: NewIdentity,
    ) -> Result<Applicant, BootcampError> {
        let mut camp = self.load(camp_id).await?;

        let applicant = embedded_applicant(camp_id, input);
        let username = applicant.identity.username.trim().to_string();
        if camp.has_username(&username) {
            return Err(BootcampError::Conflict(format!(
                "Username '{username}' already exists"
            )));
        }

        // The top-level record owns the username; the camp keeps a copy.
        let applicant = match self
            .identities
            .persist(Identity::Applicant(applicant), true)
            .await?
        {
            Identity::Applicant(applicant) => applicant,
            other => {
                return Err(BootcampError::Internal(format!(
                    "Enrolled {} came back as {}",
                    other.username(),
                    other.kind()
                )));
            }
        };

        camp.applicants.push(applicant.clone());

        match self.store.update_bootcamp(&camp).await? {
            WriteOutcome::Written => {}
            WriteOutcome::Stale | WriteOutcome::Duplicate => {
                if let Err(e) = self.store.delete_identity(&applicant.identity.id).await {
                    warn!(error = %e, username = %username, "Failed to roll back enrolled applicant");
                }
                return Err(BootcampError::Conflict(format!(
                    "Bootcamp '{}' was modified concurrently",
                    camp.name
                )));
            }
        }

        info!(
            username = %applicant.identity.username,
            camp = %camp.name,
            "Enrolled applicant in bootcamp"
        );
        Ok(applicant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_applicant_points_back_to_its_camp() {
        let camp_id = RecordId::from("camp-1");
        let applicant = embedded_applicant(
            &camp_id,
            NewIdentity {
                username: "grace".to_string(),
                password: "hopper-pass".to_string(),
                test_score: Some(70.0),
                ..NewIdentity::default()
            },
        );

        assert_eq!(applicant.details.camp_id.as_ref(), Some(&camp_id));
        assert_eq!(applicant.details.test_score, Some(70.0));
        assert!(applicant.identity.password_modified());
    }
}
