//! Core library data structures

mod document;
mod tag;

pub use document::{DocId, Document};
pub use tag::{ReadingStatus, Tag, TagId, TagUsage};
