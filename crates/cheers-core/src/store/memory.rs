use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{SessionKey, StoreError, TokenStore};

/// Session storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> MutexGuard<'_, HashMap<SessionKey, String>> {
        // A panic mid-insert cannot leave a HashMap half-written
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>, StoreError> {
        Ok(self.values().get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<(), StoreError> {
        self.values().insert(key, value.to_string());
        Ok(())
    }

    fn delete(&self, key: SessionKey) -> Result<(), StoreError> {
        self.values().remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_delete() {
        let store = MemoryStore::new();
        assert_eq!(store.get(SessionKey::AccessToken).expect("get"), None);

        store.set(SessionKey::AccessToken, "abc").expect("set");
        assert_eq!(store.get(SessionKey::AccessToken).expect("get").as_deref(), Some("abc"));

        store.set(SessionKey::AccessToken, "def").expect("overwrite");
        assert_eq!(store.get(SessionKey::AccessToken).expect("get").as_deref(), Some("def"));

        store.delete(SessionKey::AccessToken).expect("delete");
        assert_eq!(store.get(SessionKey::AccessToken).expect("get"), None);
    }

    #[test]
    fn test_memory_store_delete_missing_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete(SessionKey::RefreshToken).is_ok());
    }
}
