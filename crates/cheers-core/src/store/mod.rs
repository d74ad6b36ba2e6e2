//! Persistence for session credentials.
//!
//! Everything the session manager persists goes through [`TokenStore`]:
//! - `KeychainStore`: OS-level secure storage via keyring
//! - `FileStore`: JSON file fallback for platforms without a keychain
//! - `MemoryStore`: process-local, for tests and throwaway sessions

pub mod file;
pub mod keychain;
pub mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use keychain::KeychainStore;
pub use memory::MemoryStore;

/// Keys the session manager writes. All of them are removed on logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    User,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::AccessToken => "access_token",
            SessionKey::RefreshToken => "refresh_token",
            SessionKey::User => "user",
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Keychain error for {key}: {source}")]
    Keyring {
        key: SessionKey,
        #[source]
        source: keyring::Error,
    },

    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// String key-value storage for session credentials.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability. Deleting a key that is not present must succeed.
pub trait TokenStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError>;

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError>;

    fn delete(&self, key: SessionKey) -> Result<(), StoreError>;

    /// Delete every session key.
    ///
    /// Keeps going after a failed delete and reports the first error.
    /// Keys that were removed stay removed.
    fn clear_session(&self) -> Result<(), StoreError> {
        let mut first_error = None;
        for key in SessionKey::ALL {
            if let Err(e) = self.delete(key) {
                tracing::warn!(%key, error = %e, "Failed to delete session key");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: SessionKey) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn clear_session(&self) -> Result<(), StoreError> {
        (**self).clear_session()
    }
}
