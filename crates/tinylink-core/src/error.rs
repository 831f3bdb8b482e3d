use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The closed set of failures a storage backend can report.
///
/// `Conflict` and `Deleted` are contract-level outcomes callers are expected
/// to match on (the HTTP layer turns them into 409- and 410-style responses).
/// The remaining variants wrap backend failures with operation context.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage already has a record with id {0}")]
    Conflict(String),
    #[error("record with id {0} is marked as deleted")]
    Deleted(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage i/o failed: {0}")]
    Io(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// True when a create hit an id that already exists, live or tombstoned.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }

    /// True when a lookup hit a tombstoned record.
    pub fn is_deleted(&self) -> bool {
        matches!(self, StorageError::Deleted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_the_offending_id() {
        let err = StorageError::Conflict("abc123".to_string());
        assert!(err.is_conflict());
        assert!(!err.is_deleted());
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn deleted_is_distinct_from_conflict() {
        let err = StorageError::Deleted("abc123".to_string());
        assert!(err.is_deleted());
        assert!(!err.is_conflict());
    }
}
