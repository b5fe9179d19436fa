use sea_orm_migration::prelude::*;

mod m20260301_identity_collections;
mod m20260302_provider_subject_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_identity_collections::Migration),
            Box::new(m20260302_provider_subject_index::Migration),
        ]
    }
}
