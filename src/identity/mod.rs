//! Credential and identity lifecycle.
//!
//! [`IdentityStore`] owns the bearer token and the account it resolves to,
//! keeps both in durable storage, and leaves a [`LoginSyncMarker`] behind on
//! every change so other processes sharing the storage file can follow along.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::app::{Result, SyncError};
use crate::domain::{Credential, Identity, LoginSyncMarker};
use crate::github::RestClient;
use crate::store::{load_json, save_json, Storage, StorageKey};
use crate::validation;

#[derive(Debug, Clone)]
struct Session {
    credential: Credential,
    identity: Identity,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<Session>,
    /// Timestamp of the newest marker this instance wrote or observed.
    last_marker: Option<DateTime<Utc>>,
}

/// A login state change made by another process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginTransition {
    LoggedIn(Identity),
    LoggedOut,
}

pub struct IdentityStore {
    storage: Arc<dyn Storage + Send + Sync>,
    profiles: Arc<RestClient>,
    state: Mutex<SessionState>,
}

impl IdentityStore {
    /// Build the store and restore any persisted session into memory.
    pub fn new(storage: Arc<dyn Storage + Send + Sync>, profiles: Arc<RestClient>) -> Result<Self> {
        let session = Self::load_session(storage.as_ref())?;
        let last_marker = Self::read_marker(storage.as_ref()).map(|m| m.timestamp);

        if let Some(session) = &session {
            tracing::info!(login = %session.identity.login, "restored persisted session");
        }

        Ok(Self {
            storage,
            profiles,
            state: Mutex::new(SessionState {
                session,
                last_marker,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Credential and identity from storage. A half-written session is discarded.
    fn load_session(storage: &(dyn Storage + Send + Sync)) -> Result<Option<Session>> {
        let token = storage.get(StorageKey::Credential)?;
        let identity = match load_json::<Identity>(storage, StorageKey::Identity) {
            Ok(identity) => identity,
            Err(SyncError::Serialization(err)) => {
                tracing::warn!(error = %err, "stored identity is unreadable, discarding");
                None
            }
            Err(err) => return Err(err),
        };

        match (token, identity) {
            (Some(token), Some(identity)) => Ok(Some(Session {
                credential: Credential::new(token),
                identity,
            })),
            (None, None) => Ok(None),
            _ => {
                tracing::warn!("incomplete session in storage, clearing");
                storage.remove(StorageKey::Credential)?;
                storage.remove(StorageKey::Identity)?;
                Ok(None)
            }
        }
    }

    fn read_marker(storage: &(dyn Storage + Send + Sync)) -> Option<LoginSyncMarker> {
        match load_json::<LoginSyncMarker>(storage, StorageKey::LoginSync) {
            Ok(marker) => marker,
            Err(err) => {
                tracing::warn!(error = %err, "could not read login sync marker");
                None
            }
        }
    }

    /// Broadcast the current state. Failure only costs other processes a
    /// notification, so it is logged rather than returned.
    fn write_marker(&self, state: &mut SessionState) {
        let marker = LoginSyncMarker {
            timestamp: Utc::now(),
            authenticated: state.session.is_some(),
            identity: state.session.as_ref().map(|s| s.identity.clone()),
        };

        match save_json(self.storage.as_ref(), StorageKey::LoginSync, &marker) {
            Ok(()) => state.last_marker = Some(marker.timestamp),
            Err(err) => tracing::warn!(error = %err, "could not write login sync marker"),
        }
    }

    fn persist(&self, credential: &Credential, identity: &Identity) -> Result<()> {
        let result = self
            .storage
            .set(StorageKey::Credential, credential.expose())
            .and_then(|_| save_json(self.storage.as_ref(), StorageKey::Identity, identity));

        if result.is_err() {
            // Never leave a token without its identity behind.
            for key in [StorageKey::Credential, StorageKey::Identity] {
                if let Err(err) = self.storage.remove(key) {
                    tracing::warn!(key = key.as_str(), error = %err, "could not roll back partial session");
                }
            }
        }
        result
    }

    /// Validate `token` against the identity endpoint and, on success, store the session.
    pub async fn login(&self, token: &str) -> Result<Identity> {
        let token = token.trim();
        if !validation::is_plausible_token(token) {
            return Err(SyncError::Authentication("token is empty or malformed".into()));
        }

        let credential = Credential::new(token);
        let identity = self
            .profiles
            .fetch_identity(&credential)
            .await
            .map_err(classify_login_failure)?;

        self.persist(&credential, &identity)?;

        let mut state = self.lock();
        state.session = Some(Session {
            credential,
            identity: identity.clone(),
        });
        self.write_marker(&mut state);

        tracing::info!(login = %identity.login, "logged in");
        Ok(identity)
    }

    /// Clear memory and storage. Safe to call when already logged out.
    pub fn logout(&self) -> Result<()> {
        let mut state = self.lock();
        let previous = state.session.take();

        let removed = self
            .storage
            .remove(StorageKey::Credential)
            .and_then(|_| self.storage.remove(StorageKey::Identity));
        self.write_marker(&mut state);

        if let Some(previous) = previous {
            tracing::info!(login = %previous.identity.login, "logged out");
        }
        removed
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.lock().session.as_ref().map(|s| s.credential.clone())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().session.as_ref().map(|s| s.identity.clone())
    }

    /// Re-validate the persisted credential. Any failure signs out.
    ///
    /// Returns the refreshed identity, or `None` when there is no valid session.
    pub async fn sync_account_info(&self) -> Result<Option<Identity>> {
        let Some(token) = self.storage.get(StorageKey::Credential)? else {
            if self.is_authenticated() {
                self.logout()?;
            }
            return Ok(None);
        };

        let credential = Credential::new(token);
        match self.profiles.fetch_identity(&credential).await {
            Ok(identity) => {
                save_json(self.storage.as_ref(), StorageKey::Identity, &identity)?;

                let mut state = self.lock();
                let changed = state
                    .session
                    .as_ref()
                    .map_or(true, |s| s.identity != identity);
                state.session = Some(Session {
                    credential,
                    identity: identity.clone(),
                });
                if changed {
                    self.write_marker(&mut state);
                }
                Ok(Some(identity))
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored credential failed re-validation, signing out");
                self.logout()?;
                Ok(None)
            }
        }
    }

    /// Pick up a login or logout another process recorded in the shared marker.
    pub fn poll_external_change(&self) -> Result<Option<LoginTransition>> {
        let Some(marker) = Self::read_marker(self.storage.as_ref()) else {
            return Ok(None);
        };

        let mut state = self.lock();
        if state
            .last_marker
            .is_some_and(|seen| marker.timestamp <= seen)
        {
            return Ok(None);
        }
        state.last_marker = Some(marker.timestamp);

        let current_login = state.session.as_ref().map(|s| s.identity.login.clone());
        let marker_login = marker.identity.as_ref().map(|i| i.login.clone());
        if marker.authenticated == current_login.is_some() && marker_login == current_login {
            return Ok(None);
        }

        if marker.authenticated {
            match Self::load_session(self.storage.as_ref())? {
                Some(session) => {
                    let identity = session.identity.clone();
                    state.session = Some(session);
                    tracing::info!(login = %identity.login, "picked up login from another process");
                    Ok(Some(LoginTransition::LoggedIn(identity)))
                }
                None => Ok(None),
            }
        } else {
            state.session = None;
            tracing::info!("picked up logout from another process");
            Ok(Some(LoginTransition::LoggedOut))
        }
    }
}

fn classify_login_failure(err: SyncError) -> SyncError {
    match err {
        e if e.is_timeout() => SyncError::Network("login timed out".into()),
        SyncError::Authentication(msg) | SyncError::Forbidden(msg) => {
            SyncError::Authentication(format!("token rejected: {}", msg))
        }
        SyncError::Serialization(e) => {
            SyncError::Authentication(format!("unexpected identity response: {}", e))
        }
        SyncError::Unknown(msg) => SyncError::Unknown(msg),
        other => SyncError::Unknown(format!("login failed: {}", other)),
    }
}
