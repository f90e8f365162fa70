use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::storage::KeyValueStorage;
use crate::error::StorageError;

/// Process-local medium. With a quota it rejects writes the way a browser does
/// once the summed size of all keys and values would pass the limit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota_bytes: Option<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self { items: Mutex::default(), quota_bytes: Some(quota_bytes) }
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn items(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items.lock().map_err(|_| StorageError::Unavailable("memory storage lock poisoned".into()))
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items()?;
        if let Some(quota) = self.quota_bytes {
            let others: usize = items.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
            let needed = (others + key.len() + value.len()) as u64;
            if needed > quota {
                return Err(StorageError::QuotaExceeded(format!("{needed} bytes needed, {quota} allowed")));
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items()?.remove(key);
        Ok(())
    }
}
