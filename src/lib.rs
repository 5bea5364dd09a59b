//! Folio: tag and reading-status engine for a folder-based document library
//!
//! Folio owns the association between documents (addressed by a normalized
//! folder/filename identifier) and a small catalog of tags, with one
//! reserved sub-category: the reading statuses `finished`, `in_progress`,
//! and `backlog`, which are mutually exclusive per document and protected
//! from rename and delete.
//!
//! # Core Concepts
//!
//! - **Identifiers**: stable document keys derived from folder + filename
//! - **Tag catalog**: named labels, unique store-wide, with three seeded
//!   protected reading-status tags
//! - **Associations**: set membership between documents and tags, enforced
//!   atomically by the SQLite store
//!
//! # Example
//!
//! ```
//! use folio::{LibraryApi, OpenStore, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let api = LibraryApi::new(Arc::new(store));
//! api.attach_tag("fiction/dune.pdf", "backlog").unwrap();
//! ```

mod api;
mod error;
pub mod ident;
mod library;
pub mod query;
pub mod scan;
pub mod storage;

pub use api::LibraryApi;
pub use error::{LibraryError, LibraryResult};
pub use library::{DocId, Document, ReadingStatus, Tag, TagId, TagUsage};
pub use query::{DocumentTree, LibraryQueries};
pub use scan::scan_tree;
pub use storage::{OpenStore, SqliteStore, StorageError, StorageResult, TagStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
