//! Domain error taxonomy

use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by library operations
///
/// Every failure is typed; no operation leaves a partial effect behind.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Tag name already in use: {0}")]
    NameConflict(String),

    #[error("Tag '{0}' is protected and cannot be renamed or deleted")]
    ProtectedTag(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;
