//! Storage backends for the library
//!
//! The catalog and association semantics are defined by the `TagStore` trait.
//! The primary implementation is `SqliteStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{OpenStore, StorageError, StorageResult, TagStore};
