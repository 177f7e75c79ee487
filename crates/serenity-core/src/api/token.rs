//! Persisted bearer-token storage.

use std::sync::Mutex;

use crate::error::ApiError;

/// Key-value slot holding the session's bearer token.
pub trait TokenStore: Send + Sync {
    fn get(&self) -> Result<Option<String>, ApiError>;
    fn set(&self, token: &str) -> Result<(), ApiError>;
    /// Remove the token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), ApiError>;
}

/// Token kept in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
    key: String,
}

impl KeyringTokenStore {
    const SERVICE: &'static str = "serenity";
    const KEY: &'static str = "token";

    pub fn new() -> Self {
        Self {
            service: Self::SERVICE.to_string(),
            key: Self::KEY.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, ApiError> {
        Ok(keyring::Entry::new(&self.service, &self.key)?)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>, ApiError> {
        match self.entry()?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, ApiError> {
        self.token
            .lock()
            .map_err(|e| ApiError::TokenStore(e.to_string()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, ApiError> {
        Ok(self.slot()?.clone())
    }

    fn set(&self, token: &str) -> Result<(), ApiError> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.slot()? = None;
        Ok(())
    }
}
