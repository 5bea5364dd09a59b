//! Storage trait definitions

use crate::error::LibraryResult;
use crate::library::{Document, Tag, TagId, TagUsage};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur at the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Storage contention: {0}")]
    Contention(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for tag/document association stores
///
/// The store is the sole writer of documents, tags, and associations, and is
/// responsible for the two core invariants: tag-name uniqueness (with
/// protection of the reading-status tags) and reading-status mutual
/// exclusivity per document. Implementations must be thread-safe
/// (Send + Sync) and must apply each operation atomically: a reader never
/// observes a document with two status tags, even transiently.
pub trait TagStore: Send + Sync {
    // === Tag catalog ===

    /// Return the tag with this name, creating it if absent
    ///
    /// Idempotent: repeated calls never duplicate and never overwrite an
    /// existing description. Concurrent creation races resolve to the
    /// winner's row.
    fn get_or_create_tag(&self, name: &str, description: Option<&str>) -> LibraryResult<Tag>;

    /// Look up a tag by name
    fn tag_by_name(&self, name: &str) -> LibraryResult<Option<Tag>>;

    /// Rename a tag
    ///
    /// Fails with `ProtectedTag` when the tag is a reading-status tag and
    /// the name would change, `NameConflict` when another tag owns the new
    /// name, and `TagNotFound` for an unknown id.
    fn rename_tag(&self, id: TagId, new_name: &str) -> LibraryResult<Tag>;

    /// Update a tag's description; permitted for protected tags too
    fn update_tag_description(&self, id: TagId, description: &str) -> LibraryResult<Tag>;

    /// Delete a tag and cascade removal of all its associations
    ///
    /// Fails with `ProtectedTag` for reading-status tags and `TagNotFound`
    /// for an unknown id.
    fn delete_tag(&self, id: TagId) -> LibraryResult<()>;

    /// List all tags, ordered stably within a store snapshot
    fn list_tags(&self) -> LibraryResult<Vec<Tag>>;

    // === Associations ===

    /// Attach a tag to a document, creating either as needed
    ///
    /// Attaching a reading-status tag displaces any other status the
    /// document holds, in the same atomic step. Re-attaching an existing
    /// tag is a no-op that still returns the current document state.
    fn attach(&self, identifier: &str, tag_name: &str) -> LibraryResult<Document>;

    /// Remove an association if present; `false` when there was nothing to
    /// remove (missing document, tag, or association). Never an error, and
    /// nothing is created.
    fn detach(&self, identifier: &str, tag_name: &str) -> LibraryResult<bool>;

    /// Names of the tags on a document; empty when the document has no
    /// record (reads never create)
    fn tags_of(&self, identifier: &str) -> LibraryResult<BTreeSet<String>>;

    /// Identifiers of documents carrying a tag; empty for unknown tags
    fn documents_with_tag(&self, tag_name: &str) -> LibraryResult<BTreeSet<String>>;

    /// Usage summary over the full tag set, zero-count tags included
    fn usage_stats(&self) -> LibraryResult<BTreeMap<String, TagUsage>>;

    // === Documents ===

    /// Look up a document by identifier
    fn document(&self, identifier: &str) -> LibraryResult<Option<Document>>;

    /// Record an access time for an existing document; `false` when the
    /// document has no record (never creates one)
    fn touch(&self, identifier: &str) -> LibraryResult<bool>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: TagStore + Sized {
    /// Open or create a store at the given path; seeds the reading-status
    /// tags before returning
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing), seeded the same way
    fn open_in_memory() -> StorageResult<Self>;
}
