use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    BootcampService, IdentityService, SeaOrmBootcampService, SeaOrmIdentityService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub identity_service: Arc<dyn IdentityService>,

    pub bootcamp_service: Arc<dyn BootcampService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    /// Wires the services over an already connected store.
    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let identity_service = Arc::new(SeaOrmIdentityService::new(
            store.clone(),
            config.security.username_max_attempts,
        )) as Arc<dyn IdentityService>;

        let bootcamp_service =
            Arc::new(SeaOrmBootcampService::new(store.clone())) as Arc<dyn BootcampService>;

        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            identity_service,
            bootcamp_service,
        }
    }
}
