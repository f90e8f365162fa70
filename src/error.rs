use thiserror::Error;

/// Failure reported by a key-value storage medium.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Tagged failure surfaced by the persistence layer.
///
/// Read-path problems are recovered inside [`Persistence::load`] and only ever
/// logged; write-path problems always reach the caller as one of these.
///
/// [`Persistence::load`]: crate::application::persistence::Persistence::load
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("failed to decode stored data: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PersistenceError {
    /// Stable machine-readable tag.
    pub fn code(&self) -> &'static str {
        match self {
            PersistenceError::QuotaExceeded => "QUOTA_EXCEEDED",
            PersistenceError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            PersistenceError::Parse(_) => "PARSE_ERROR",
        }
    }
}

impl From<StorageError> for PersistenceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded(_) => PersistenceError::QuotaExceeded,
            StorageError::Unavailable(reason) => PersistenceError::StorageUnavailable(reason),
        }
    }
}

pub type Result<T, E = PersistenceError> = std::result::Result<T, E>;
