use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, SyncError};
use crate::cache::ContentCache;
use crate::config::Config;
use crate::fetcher::RequestExecutor;
use crate::gateway::DiscussionGateway;
use crate::github::{GraphqlClient, RestClient};
use crate::identity::IdentityStore;
use crate::presenter::{DiscussionPresenter, Notifier};
use crate::store::{SqliteStorage, Storage};

/// Every long-lived component, built once and shared.
pub struct AppContext {
    pub config: Config,
    pub storage: Arc<dyn Storage + Send + Sync>,
    pub cache: Arc<ContentCache>,
    pub identity: Arc<IdentityStore>,
    pub gateway: Arc<DiscussionGateway>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let db_path = match &config.storage.path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };
        let storage = Arc::new(SqliteStorage::new(&db_path)?);
        Self::with_storage(config, storage)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        config.validate()?;
        Self::with_storage(config, Arc::new(SqliteStorage::in_memory()?))
    }

    pub fn with_storage(config: Config, storage: Arc<dyn Storage + Send + Sync>) -> Result<Self> {
        let executor = Arc::new(RequestExecutor::new(config.http.clone())?);
        let rest = Arc::new(RestClient::new(executor.clone(), &config));
        let graphql = Arc::new(GraphqlClient::new(executor, &config));
        let identity = Arc::new(IdentityStore::new(storage.clone(), rest.clone())?);
        let cache = Arc::new(ContentCache::new());
        let gateway = Arc::new(DiscussionGateway::new(
            identity.clone(),
            cache.clone(),
            graphql,
            rest,
            config.cache.clone(),
        ));

        Ok(Self {
            config,
            storage,
            cache,
            identity,
            gateway,
        })
    }

    pub fn presenter(&self, notifier: Arc<dyn Notifier>) -> DiscussionPresenter {
        DiscussionPresenter::new(
            self.gateway.clone(),
            self.identity.clone(),
            notifier,
            &self.config.listing,
        )
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SyncError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("boardsync");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("session.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn on_disk_context_uses_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = testing::config("http://127.0.0.1:9");
        config.storage.path = Some(dir.path().join("session.db"));

        let ctx = AppContext::new(config).unwrap();

        assert!(!ctx.identity.is_authenticated());
        assert!(dir.path().join("session.db").exists());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = testing::config("http://127.0.0.1:9");
        config.repository.owner.clear();

        let err = AppContext::in_memory(config).err().unwrap();
        assert!(matches!(err, SyncError::Config(_)));
    }
}
