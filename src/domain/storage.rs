use std::sync::Arc;

use crate::error::StorageError;

const PROBE_KEY: &str = "__storage_test__";

/// A string-keyed, string-valued storage medium, shaped after browser local storage.
///
/// Calls are synchronous and never suspend. Writes replace the previous value.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Round-trips a throwaway key. A medium within a few dozen bytes of its
    /// quota fails this with `QuotaExceeded` even though reads still work.
    fn probe(&self) -> Result<(), StorageError> {
        self.set_item(PROBE_KEY, PROBE_KEY)?;
        self.remove_item(PROBE_KEY)
    }

    fn is_available(&self) -> bool { self.probe().is_ok() }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> { (**self).get_item(key) }
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> { (**self).set_item(key, value) }
    fn remove_item(&self, key: &str) -> Result<(), StorageError> { (**self).remove_item(key) }
    fn probe(&self) -> Result<(), StorageError> { (**self).probe() }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> { (**self).get_item(key) }
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> { (**self).set_item(key, value) }
    fn remove_item(&self, key: &str) -> Result<(), StorageError> { (**self).remove_item(key) }
    fn probe(&self) -> Result<(), StorageError> { (**self).probe() }
}
