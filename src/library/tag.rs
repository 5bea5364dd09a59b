//! Tag representation and the reserved reading-status set

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate identifier for a tag row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagId(i64);

impl TagId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TagId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The mutually exclusive built-in reading statuses
///
/// At most one of these may be attached to a document at any time; attaching
/// one displaces whichever other status the document held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Finished,
    InProgress,
    Backlog,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::Finished,
        ReadingStatus::InProgress,
        ReadingStatus::Backlog,
    ];

    /// Canonical tag name for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Finished => "finished",
            ReadingStatus::InProgress => "in_progress",
            ReadingStatus::Backlog => "backlog",
        }
    }

    /// Parse a tag name into a status, if it is one
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "finished" => Some(ReadingStatus::Finished),
            "in_progress" => Some(ReadingStatus::InProgress),
            "backlog" => Some(ReadingStatus::Backlog),
            _ => None,
        }
    }

    /// Description the status tag is seeded with
    pub fn seed_description(&self) -> &'static str {
        match self {
            ReadingStatus::Finished => "Books you have finished reading",
            ReadingStatus::InProgress => "Books you are currently reading",
            ReadingStatus::Backlog => "Books you plan to read in the future",
        }
    }

    /// Whether `name` is one of the reading-status tag names
    pub fn is_status_name(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Surrogate id
    pub id: TagId,
    /// Unique, case-sensitive name
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// When the tag was created
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Protected tags (the reading statuses) can never be renamed or deleted.
    /// Derived from the name so it can never drift from the catalog state.
    pub fn is_protected(&self) -> bool {
        ReadingStatus::is_status_name(&self.name)
    }
}

/// Per-tag usage summary, as reported by usage statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    /// Number of documents currently carrying the tag
    pub count: u64,
    /// The tag's description, passed through for display
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_round_trip() {
        for status in ReadingStatus::ALL {
            assert_eq!(ReadingStatus::from_name(status.as_str()), Some(status));
        }
        assert_eq!(ReadingStatus::from_name("favorite"), None);
    }

    #[test]
    fn protection_is_derived_from_name() {
        let tag = |name: &str| Tag {
            id: TagId::new(1),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        };
        assert!(tag("finished").is_protected());
        assert!(tag("in_progress").is_protected());
        assert!(tag("backlog").is_protected());
        assert!(!tag("favorite").is_protected());
        // case-sensitive: only the exact names are reserved
        assert!(!tag("Finished").is_protected());
    }
}
