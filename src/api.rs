//! Transport-independent API layer.
//!
//! `LibraryApi` is the single entry point for all consumer-facing operations.
//! Transports (CLI, HTTP, direct embedding) call `LibraryApi` methods and
//! never reach into the store directly. This is also where untrusted input
//! is validated: attach/detach accept only tag names already present in the
//! catalog, so a caller cannot grow the tag set through the association
//! endpoints.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{LibraryError, LibraryResult};
use crate::library::{Document, Tag, TagId, TagUsage};
use crate::storage::TagStore;

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct LibraryApi {
    store: Arc<dyn TagStore>,
}

impl LibraryApi {
    /// Create a new API instance over a store.
    pub fn new(store: Arc<dyn TagStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for read-only query building.
    pub fn store(&self) -> &dyn TagStore {
        self.store.as_ref()
    }

    /// Check an untrusted tag name against the catalog whitelist.
    ///
    /// The whitelist is the live catalog: the seeded reading-status names
    /// plus every tag created through `create_tag`.
    fn require_known_tag(&self, tag_name: &str) -> LibraryResult<()> {
        if tag_name.trim().is_empty() {
            return Err(LibraryError::Validation(
                "tag name must not be empty".to_string(),
            ));
        }
        if self.store.tag_by_name(tag_name)?.is_none() {
            return Err(LibraryError::Validation(format!(
                "tag name '{}' is not in the allowed set",
                tag_name
            )));
        }
        Ok(())
    }

    // --- Associations ---

    /// Attach a tag to a document. The tag must already exist in the
    /// catalog; the document is created lazily.
    pub fn attach_tag(&self, identifier: &str, tag_name: &str) -> LibraryResult<Document> {
        self.require_known_tag(tag_name)?;
        self.store.attach(identifier, tag_name)
    }

    /// Detach a tag from a document; returns whether anything was removed.
    pub fn detach_tag(&self, identifier: &str, tag_name: &str) -> LibraryResult<bool> {
        self.require_known_tag(tag_name)?;
        self.store.detach(identifier, tag_name)
    }

    /// Tag names currently on a document (empty for unknown documents).
    pub fn tags_for_document(&self, identifier: &str) -> LibraryResult<BTreeSet<String>> {
        self.store.tags_of(identifier)
    }

    /// Identifiers of documents carrying a tag (empty for unknown tags).
    pub fn documents_for_tag(&self, tag_name: &str) -> LibraryResult<BTreeSet<String>> {
        self.store.documents_with_tag(tag_name)
    }

    /// Record that a document was opened; `false` if it has no record yet.
    pub fn touch_document(&self, identifier: &str) -> LibraryResult<bool> {
        self.store.touch(identifier)
    }

    // --- Tag catalog ---

    /// Create a tag (or return the existing one with that name).
    pub fn create_tag(&self, name: &str, description: &str) -> LibraryResult<Tag> {
        let description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        self.store.get_or_create_tag(name, description)
    }

    /// Rename a tag; protected tags refuse any name change.
    pub fn rename_tag(&self, id: TagId, new_name: &str) -> LibraryResult<Tag> {
        self.store.rename_tag(id, new_name)
    }

    /// Update a tag's description (allowed for protected tags).
    pub fn update_tag_description(&self, id: TagId, description: &str) -> LibraryResult<Tag> {
        self.store.update_tag_description(id, description)
    }

    /// Delete a non-protected tag, removing it from every document.
    pub fn delete_tag(&self, id: TagId) -> LibraryResult<()> {
        self.store.delete_tag(id)
    }

    /// All tags in the catalog.
    pub fn list_tags(&self) -> LibraryResult<Vec<Tag>> {
        self.store.list_tags()
    }

    /// Per-tag usage statistics, zero-count tags included.
    pub fn tag_statistics(&self) -> LibraryResult<BTreeMap<String, TagUsage>> {
        self.store.usage_stats()
    }
}
