use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::domain::{Bootcamp, Identity, IdentityKind, RecordId};
use crate::services::username::{UsernameError, UsernameLookup};

pub mod migrator;
pub mod repositories;

pub use repositories::WriteOutcome;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let memory = is_memory_url(db_url);
        // Every pooled connection to an in-memory SQLite database sees its
        // own empty database, so keep exactly one.
        let (max_connections, min_connections) = if memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn bootcamp_repo(&self) -> repositories::bootcamp::BootcampRepository {
        repositories::bootcamp::BootcampRepository::new(self.conn.clone())
    }

    pub async fn get_identity(&self, id: &RecordId) -> Result<Option<Identity>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_identity_by_username(&self, username: &str) -> Result<Option<Identity>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_identity_by_provider(
        &self,
        provider: &str,
        subject: &str,
    ) -> Result<Option<Identity>> {
        self.user_repo()
            .get_by_provider_subject(provider, subject)
            .await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn list_identities(&self, kind: IdentityKind) -> Result<Vec<Identity>> {
        self.user_repo().list_by_kind(kind).await
    }

    pub async fn insert_identity(&self, identity: &Identity) -> Result<WriteOutcome> {
        self.user_repo().insert(identity).await
    }

    pub async fn update_identity(&self, identity: &Identity) -> Result<WriteOutcome> {
        self.user_repo().update(identity).await
    }

    pub async fn delete_identity(&self, id: &RecordId) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn get_bootcamp(&self, id: &RecordId) -> Result<Option<Bootcamp>> {
        self.bootcamp_repo().get(id).await
    }

    pub async fn list_bootcamps(&self) -> Result<Vec<Bootcamp>> {
        self.bootcamp_repo().list_all().await
    }

    pub async fn insert_bootcamp(&self, camp: &Bootcamp) -> Result<()> {
        self.bootcamp_repo().insert(camp).await
    }

    pub async fn update_bootcamp(&self, camp: &Bootcamp) -> Result<WriteOutcome> {
        self.bootcamp_repo().update(camp).await
    }
}

#[async_trait]
impl UsernameLookup for Store {
    async fn username_taken(&self, candidate: &str) -> Result<bool, UsernameError> {
        Ok(self.username_exists(candidate).await?)
    }
}

fn is_memory_url(db_url: &str) -> bool {
    db_url.contains(":memory:")
}
