//! Recover the signed-in user from request-scoped credential storage.
//!
//! The credential store is the request's session. Resolving never fails: an
//! absent entry, an entry that no longer decodes and a store that cannot be
//! read all mean "nobody is signed in".

use async_trait::async_trait;
use serde_json::Value;
use tower_sessions::Session;

use crate::models::{SessionUser, session_keys};

/// Errors from the credential store.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    /// The session backend failed.
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The store is unavailable for another reason.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage scoped to one client.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a value. `Ok(None)` if the key is not set.
    async fn get(&self, key: &str) -> Result<Option<Value>, CredentialStoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: Value) -> Result<(), CredentialStoreError>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), CredentialStoreError>;
}

#[async_trait]
impl CredentialStore for Session {
    async fn get(&self, key: &str) -> Result<Option<Value>, CredentialStoreError> {
        Ok(self.get_value(key).await?)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CredentialStoreError> {
        self.insert_value(key, value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.remove_value(key).await?;
        Ok(())
    }
}

/// The signed-in user, or `None`.
///
/// Store errors are logged and treated as "not signed in".
pub async fn resolve(store: &(impl CredentialStore + ?Sized)) -> Option<SessionUser> {
    let value = match store.get(session_keys::CURRENT_USER).await {
        Ok(value) => value?,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session; treating as signed out");
            return None;
        }
    };

    match serde_json::from_value(value) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding undecodable session user");
            None
        }
    }
}

/// Record `user` as signed in.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub async fn sign_in(
    store: &(impl CredentialStore + ?Sized),
    user: &SessionUser,
) -> Result<(), CredentialStoreError> {
    let value = serde_json::to_value(user)
        .map_err(|e| CredentialStoreError::Unavailable(e.to_string()))?;
    store.set(session_keys::CURRENT_USER, value).await
}

/// Forget the signed-in user.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub async fn sign_out(store: &(impl CredentialStore + ?Sized)) -> Result<(), CredentialStoreError> {
    store.remove(session_keys::CURRENT_USER).await
}
