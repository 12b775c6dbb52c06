//! Typed error type for the storage boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// No record under the given id.
    #[error("record not found")]
    NotFound,

    /// `update_workflow` was given a stale version.
    #[error("workflow version conflict: expected {expected}, got {given}")]
    VersionConflict { expected: u64, given: u64 },

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Internal(String),
}
