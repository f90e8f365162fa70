use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::domain::storage::KeyValueStorage;
use crate::error::StorageError;

/// Directory-backed medium: one file per key, replaced atomically on write.
///
/// Key characters outside `[A-Za-z0-9_-]` are percent-encoded in file names, so
/// no entry name starts with a dot and dotfiles are free for scratch use.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| map_io(&dir, e))?;
        Ok(Self { dir, quota_bytes: None })
    }

    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    pub fn dir(&self) -> &Path { &self.dir }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(encode_key(key))
    }

    fn usage_excluding(&self, skip: &Path) -> Result<u64, StorageError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir).map_err(|e| map_io(&self.dir, e))? {
            let entry = entry.map_err(|e| map_io(&self.dir, e))?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') || entry.path() == skip {
                continue;
            }
            let meta = entry.metadata().map_err(|e| map_io(&entry.path(), e))?;
            if meta.is_file() {
                total += name.len() as u64 + meta.len();
            }
        }
        Ok(total)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_io(&path, e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if let Some(quota) = self.quota_bytes {
            let needed = self.usage_excluding(&path)? + encode_key(key).len() as u64 + value.len() as u64;
            if needed > quota {
                return Err(StorageError::QuotaExceeded(format!("{needed} bytes needed, {quota} allowed")));
            }
        }
        // Scratch file is a `.tmp*` dotfile, deleted on drop if any step fails.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(|e| map_io(&self.dir, e))?;
        tmp.write_all(value.as_bytes()).map_err(|e| map_io(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| map_io(&path, e.error))?;
        tracing::trace!(key, bytes = value.len(), "storage item written");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_io(&path, e)),
        }
    }
}

fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

fn map_io(path: &Path, err: io::Error) -> StorageError {
    match err.kind() {
        ErrorKind::StorageFull => StorageError::QuotaExceeded(format!("{}: {err}", path.display())),
        _ => StorageError::Unavailable(format!("{}: {err}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_unsafe_key_characters() {
        assert_eq!(encode_key("taskflow-store"), "taskflow-store");
        assert_eq!(encode_key("__storage_test__"), "__storage_test__");
        assert_eq!(encode_key("../x y"), "%2E%2E%2Fx%20y");
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        storage.set_item("taskflow-theme", "dark").unwrap();
        drop(storage);

        let reopened = FileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.get_item("taskflow-theme").unwrap().as_deref(), Some("dark"));
        reopened.remove_item("taskflow-theme").unwrap();
        assert_eq!(reopened.get_item("taskflow-theme").unwrap(), None);
        reopened.remove_item("taskflow-theme").unwrap();
    }

    #[test]
    fn quota_rejects_oversized_write_and_keeps_old_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap().with_quota(64);
        storage.set_item("k", "small").unwrap();
        let err = storage.set_item("k", &"x".repeat(100)).unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded(_)));
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("small"));
        assert!(storage.is_available());
    }

    #[test]
    fn failed_write_leaves_no_scratch_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let blocked = storage.path_for("k");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("inner"), "x").unwrap();

        let err = storage.set_item("k", "value").unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));

        let scratch: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with('.'))
            .collect();
        assert!(scratch.is_empty(), "left behind: {scratch:?}");
    }
}
