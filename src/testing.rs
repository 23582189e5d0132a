//! Shared fixtures for tests that talk to a local mock server.

use std::sync::Arc;

use crate::config::{Config, HttpConfig};
use crate::fetcher::RequestExecutor;

pub fn config(server_uri: &str) -> Config {
    let mut config = Config::default();
    config.repository.owner = "acme".into();
    config.repository.name = "site".into();
    config.endpoints.rest_base = server_uri.to_string();
    config.endpoints.graphql_url = format!("{}/graphql", server_uri);
    config.http = HttpConfig {
        timeout_ms: 2_000,
        max_retries: 1,
        retry_delay_ms: 1,
        ..HttpConfig::default()
    };
    config
}

pub fn executor(config: &Config) -> Arc<RequestExecutor> {
    Arc::new(RequestExecutor::new(config.http.clone()).expect("executor"))
}

pub const TOKEN: &str = "ghp_test";

/// In-memory storage holding a session for `login` authenticated with [`TOKEN`].
pub fn seeded_storage(login: &str) -> crate::store::SqliteStorage {
    use crate::domain::Identity;
    use crate::store::{save_json, SqliteStorage, Storage, StorageKey};

    let storage = SqliteStorage::in_memory().expect("storage");
    storage.set(StorageKey::Credential, TOKEN).expect("credential");
    let identity = Identity {
        login: login.to_string(),
        id: 1,
        avatar_url: String::new(),
        display_name: login.to_string(),
        email: None,
    };
    save_json(&storage, StorageKey::Identity, &identity).expect("identity");
    storage
}
