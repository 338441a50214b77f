use tat_types::{EntityId, TatError};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage-layer errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(EntityId),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("version mismatch for {id}: expected {expected}, found {found}")]
    VersionMismatch {
        id: EntityId,
        expected: u64,
        found: u64,
    },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<StorageError> for TatError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => TatError::EntityNotFound(id),
            StorageError::VersionMismatch { id, .. } => TatError::ConcurrentModification(id),
            other => TatError::Storage(other.to_string()),
        }
    }
}
