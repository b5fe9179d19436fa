use anyhow::{Context, Result};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use super::{WriteOutcome, parse_optional_timestamp, parse_timestamp};
use crate::domain::{Bootcamp, RecordId};
use crate::entities::bootcamps;

pub struct BootcampRepository {
    conn: DatabaseConnection,
}

impl BootcampRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: &RecordId) -> Result<Option<Bootcamp>> {
        let model = bootcamps::Entity::find_by_id(id.as_str())
            .one(&self.conn)
            .await
            .context("Failed to query bootcamp")?;

        model.map(bootcamp_from_model).transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<Bootcamp>> {
        let models = bootcamps::Entity::find()
            .order_by_desc(bootcamps::Column::Created)
            .all(&self.conn)
            .await
            .context("Failed to list bootcamps")?;

        models.into_iter().map(bootcamp_from_model).collect()
    }

    pub async fn insert(&self, camp: &Bootcamp) -> Result<()> {
        bootcamps::Entity::insert(active_model(camp, camp.revision)?)
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert bootcamp")?;

        Ok(())
    }

    /// Conditional on the revision carried by `camp`.
    pub async fn update(&self, camp: &Bootcamp) -> Result<WriteOutcome> {
        let expected = camp.revision;

        let result = bootcamps::Entity::update_many()
            .set(active_model(camp, expected + 1)?)
            .filter(bootcamps::Column::Id.eq(camp.id.as_str()))
            .filter(bootcamps::Column::Revision.eq(expected))
            .exec(&self.conn)
            .await
            .context("Failed to update bootcamp")?;

        if result.rows_affected == 0 {
            Ok(WriteOutcome::Stale)
        } else {
            Ok(WriteOutcome::Written)
        }
    }
}

fn active_model(camp: &Bootcamp, revision: i64) -> Result<bootcamps::ActiveModel> {
    Ok(bootcamps::ActiveModel {
        id: Set(camp.id.to_string()),
        name: Set(camp.name.clone()),
        start_date: Set(camp.start_date.map(|t| t.to_rfc3339())),
        end_date: Set(camp.end_date.map(|t| t.to_rfc3339())),
        created: Set(camp.created.to_rfc3339()),
        applicants: Set(serde_json::to_value(&camp.applicants)?),
        user_id: Set(camp.user.as_ref().map(ToString::to_string)),
        revision: Set(revision),
    })
}

fn bootcamp_from_model(model: bootcamps::Model) -> Result<Bootcamp> {
    let mut camp = Bootcamp::new(model.name, model.user_id.map(RecordId::from));
    camp.id = RecordId::from(model.id);
    camp.start_date = parse_optional_timestamp(model.start_date.as_deref())?;
    camp.end_date = parse_optional_timestamp(model.end_date.as_deref())?;
    camp.created = parse_timestamp(&model.created)?;
    camp.applicants =
        serde_json::from_value(model.applicants).context("Invalid embedded applicants")?;
    camp.revision = model.revision;
    Ok(camp)
}
