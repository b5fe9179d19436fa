use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::{Map, Value};

use super::{WriteOutcome, is_unique_violation, parse_optional_timestamp, parse_timestamp};
use crate::domain::{
    Applicant, ApplicantDetails, BaseIdentity, Credentialed, Identity, IdentityKind, Instructor,
    InstructorDetails, RecordId,
};
use crate::entities::users;

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get identity by ID
    pub async fn get_by_id(&self, id: &RecordId) -> Result<Option<Identity>> {
        let model = users::Entity::find_by_id(id.as_str())
            .one(&self.conn)
            .await
            .context("Failed to query identity by ID")?;

        model.map(identity_from_model).transpose()
    }

    /// Get identity by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<Identity>> {
        let model = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query identity by username")?;

        model.map(identity_from_model).transpose()
    }

    /// Find a returning external-provider login
    pub async fn get_by_provider_subject(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Identity>> {
        let model = users::Entity::find()
            .filter(users::Column::Provider.eq(provider))
            .filter(users::Column::ProviderSubject.eq(subject))
            .one(&self.conn)
            .await
            .context("Failed to query identity by provider subject")?;

        model.map(identity_from_model).transpose()
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let id = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::Username.eq(username))
            .into_tuple::<String>()
            .one(&self.conn)
            .await
            .context("Failed to check username")?;

        Ok(id.is_some())
    }

    pub async fn list_by_kind(&self, kind: IdentityKind) -> Result<Vec<Identity>> {
        let models = users::Entity::find()
            .filter(users::Column::Kind.eq(kind.as_str()))
            .order_by_asc(users::Column::Created)
            .all(&self.conn)
            .await
            .context("Failed to list identities")?;

        models.into_iter().map(identity_from_model).collect()
    }

    pub async fn insert(&self, identity: &Identity) -> Result<WriteOutcome> {
        let active = active_model(identity, identity.identity().revision)?;

        match users::Entity::insert(active)
            .exec_without_returning(&self.conn)
            .await
        {
            Ok(_) => Ok(WriteOutcome::Written),
            Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Duplicate),
            Err(e) => Err(e).context("Failed to insert identity"),
        }
    }

    /// Writes the identity only if the stored revision still matches the one
    /// carried by `identity`; the stored revision is bumped by one.
    pub async fn update(&self, identity: &Identity) -> Result<WriteOutcome> {
        let expected = identity.identity().revision;
        let active = active_model(identity, expected + 1)?;

        let result = users::Entity::update_many()
            .set(active)
            .filter(users::Column::Id.eq(identity.id().as_str()))
            .filter(users::Column::Revision.eq(expected))
            .exec(&self.conn)
            .await;

        match result {
            Ok(res) if res.rows_affected == 0 => Ok(WriteOutcome::Stale),
            Ok(_) => Ok(WriteOutcome::Written),
            Err(e) if is_unique_violation(&e) => Ok(WriteOutcome::Duplicate),
            Err(e) => Err(e).context("Failed to update identity"),
        }
    }

    pub async fn delete(&self, id: &RecordId) -> Result<bool> {
        let result = users::Entity::delete_by_id(id.as_str())
            .exec(&self.conn)
            .await
            .context("Failed to delete identity")?;

        Ok(result.rows_affected > 0)
    }
}

/// External account id recorded by the provider under `id`.
#[must_use]
pub fn provider_subject(provider_data: &Value) -> Option<String> {
    match provider_data.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn active_model(identity: &Identity, revision: i64) -> Result<users::ActiveModel> {
    let base = identity.identity();

    let details = match identity {
        Identity::User(_) => Value::Object(Map::new()),
        Identity::Applicant(a) => serde_json::to_value(&a.details)?,
        Identity::Instructor(i) => serde_json::to_value(&i.details)?,
    };

    Ok(users::ActiveModel {
        id: Set(base.id.to_string()),
        kind: Set(identity.kind().as_str().to_string()),
        username: Set(base.username.clone()),
        first_name: Set(base.first_name.clone()),
        last_name: Set(base.last_name.clone()),
        email: Set(base.email.clone()),
        password: Set(base.password.clone()),
        salt: Set(base.salt.clone()),
        provider: Set(base.provider.clone()),
        provider_subject: Set(provider_subject(&base.provider_data)),
        provider_data: Set(base.provider_data.clone()),
        additional_providers_data: Set(Value::Object(base.additional_providers_data.clone())),
        roles: Set(serde_json::to_value(&base.roles)?),
        details: Set(details),
        revision: Set(revision),
        created: Set(base.created.to_rfc3339()),
        updated: Set(base.updated.map(|t| t.to_rfc3339())),
    })
}

fn identity_from_model(model: users::Model) -> Result<Identity> {
    let kind: IdentityKind = model.kind.parse().map_err(anyhow::Error::msg)?;

    let mut base = BaseIdentity::new(model.username, model.provider);
    base.id = RecordId::from(model.id);
    base.first_name = model.first_name;
    base.last_name = model.last_name;
    base.email = model.email;
    base.password = model.password;
    base.salt = model.salt;
    base.provider_data = model.provider_data;
    base.additional_providers_data = match model.additional_providers_data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    base.roles = serde_json::from_value(model.roles).context("Invalid stored roles")?;
    base.created = parse_timestamp(&model.created)?;
    base.updated = parse_optional_timestamp(model.updated.as_deref())?;
    base.revision = model.revision;

    let identity = match kind {
        IdentityKind::User => Identity::User(base),
        IdentityKind::Applicant => {
            let details: ApplicantDetails =
                serde_json::from_value(model.details).context("Invalid applicant details")?;
            Identity::Applicant(Applicant {
                identity: base,
                details,
            })
        }
        IdentityKind::Instructor => {
            let details: InstructorDetails =
                serde_json::from_value(model.details).context("Invalid instructor details")?;
            Identity::Instructor(Instructor {
                identity: base,
                details,
            })
        }
    };

    Ok(identity)
}
