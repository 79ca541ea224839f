//! # File Storage Errors

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// File absent, or owned by someone else. Callers cannot tell which.
    #[error("File not found")]
    NotFound,

    // Validation errors
    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    #[error("Invalid file: {0}")]
    InvalidFile(String),

    // Data errors
    #[error("Stored payload is corrupt")]
    CorruptPayload,

    // Internal
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::NotFound => 404,
            StorageError::FileTooLarge(_, _) => 413,
            StorageError::InvalidFile(_) => 400,
            StorageError::CorruptPayload => 500,
            StorageError::Internal(_) => 500,
        }
    }

    /// Message safe to show to clients
    pub fn public_message(&self) -> String {
        if self.status_code() < 500 {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StorageError::NotFound.status_code(), 404);
        assert_eq!(StorageError::FileTooLarge(100, 50).status_code(), 413);
        assert_eq!(StorageError::InvalidFile("empty name".into()).status_code(), 400);
        assert_eq!(StorageError::CorruptPayload.status_code(), 500);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = StorageError::Internal("Lock poisoned".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(StorageError::NotFound.public_message(), "File not found");
    }
}
