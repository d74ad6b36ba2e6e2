use keyring::Entry;
use tracing::debug;

use super::{SessionKey, StoreError, TokenStore};

/// Keychain service name used when the config does not override it.
pub const DEFAULT_SERVICE_NAME: &str = "cheers";

/// Session storage in the OS keychain, one entry per key.
#[derive(Debug, Clone)]
pub struct KeychainStore {
    service: String,
}

impl KeychainStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: SessionKey) -> Result<Entry, StoreError> {
        Entry::new(&self.service, key.as_str()).map_err(|source| StoreError::Keyring { key, source })
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl TokenStore for KeychainStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(source) => Err(StoreError::Keyring { key, source }),
        }
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|source| StoreError::Keyring { key, source })
    }

    fn delete(&self, key: SessionKey) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => {
                debug!(%key, "Keychain entry already absent");
                Ok(())
            }
            Err(source) => Err(StoreError::Keyring { key, source }),
        }
    }
}
