//! Document representation in the library

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Surrogate identifier for a document row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(i64);

impl DocId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DocId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document in the library
///
/// Documents are created lazily on first tag attach and addressed from the
/// outside by their normalized `identifier`; the surrogate [`DocId`] only
/// matters for relation storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Surrogate id, assigned on first persistence
    pub id: DocId,
    /// Normalized folder/filename composite, unique across the store
    pub identifier: String,
    /// Folder component ([`crate::ident::ROOT`] for top-level files)
    pub folder: String,
    /// Filename component
    pub filename: String,
    /// When the document was first persisted
    pub added_at: DateTime<Utc>,
    /// When the document was last opened, if ever
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Names of the tags currently attached
    pub tags: BTreeSet<String>,
}

impl Document {
    /// Whether the document currently carries the given tag
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    /// The document's current reading status, if any
    pub fn reading_status(&self) -> Option<super::ReadingStatus> {
        self.tags
            .iter()
            .find_map(|name| super::ReadingStatus::from_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::ReadingStatus;

    fn sample(tags: &[&str]) -> Document {
        Document {
            id: DocId::new(1),
            identifier: "shelf/book.pdf".to_string(),
            folder: "shelf".to_string(),
            filename: "book.pdf".to_string(),
            added_at: Utc::now(),
            last_accessed_at: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn reading_status_from_tags() {
        assert_eq!(sample(&[]).reading_status(), None);
        assert_eq!(
            sample(&["favorite", "backlog"]).reading_status(),
            Some(ReadingStatus::Backlog)
        );
    }

    #[test]
    fn has_tag_checks_membership() {
        let doc = sample(&["favorite"]);
        assert!(doc.has_tag("favorite"));
        assert!(!doc.has_tag("finished"));
    }
}
