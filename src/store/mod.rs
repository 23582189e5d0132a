pub mod sqlite;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::app::Result;

pub use sqlite::SqliteStorage;

/// Fixed slots in durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Credential,
    Identity,
    LoginSync,
}

impl StorageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Credential => "github_token",
            StorageKey::Identity => "github_user",
            StorageKey::LoginSync => "login_sync",
        }
    }
}

/// Durable string slots shared by every process using the same backing file.
///
/// Writers do not coordinate: the last write to a key wins.
pub trait Storage {
    fn get(&self, key: StorageKey) -> Result<Option<String>>;
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;
    fn remove(&self, key: StorageKey) -> Result<()>;
}

pub fn load_json<T: DeserializeOwned>(
    storage: &(dyn Storage + Send + Sync),
    key: StorageKey,
) -> Result<Option<T>> {
    match storage.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize>(
    storage: &(dyn Storage + Send + Sync),
    key: StorageKey,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}
